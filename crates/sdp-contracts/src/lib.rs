//! §4.6 Contract Engine: generation and validation of shared-boundary
//! contract documents.

mod generate;
mod validate;

pub use generate::{contract_path, generate, ContractDocument, GenerateError};
pub use validate::{validate_all, Severity, ValidateError, Violation, ViolationKind};
