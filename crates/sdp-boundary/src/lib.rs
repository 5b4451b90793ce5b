//! §4.4 Scope Boundary Guard and §4.5 Shared-Boundary Analyzer.

mod scope;
mod shared;

pub use scope::{check_scope, ScopeVerdict};
pub use shared::{find_shared_boundaries, Boundary, FeatureScope};
