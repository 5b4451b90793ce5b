//! §4.13 Attestation Builder: assembles and persists the per-feature
//! attestation statement that records intent, plan, execution, boundary
//! compliance, verification outcome and provenance for a completed feature.

pub mod builder;
pub mod model;
pub mod writer;

pub use builder::{build, AttestationInput, TrackerMapping};
pub use model::{
    AttestationStatement, Boundary, Execution, GateResult, Intent, Plan, Provenance, Review, SelfReview, Trace,
    Verification,
};
pub use writer::{evidence_path, write, AttestationWriteError};
