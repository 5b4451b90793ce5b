//! §4.13 Attestation Builder: the immutable per-phase-transition statement.

use chrono::{DateTime, Utc};
use sdp_phase_api::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub source_issue: String,
    pub trigger: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub workstreams: Vec<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub external_ids: Vec<String>,
    pub branch: String,
    pub changed_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub phase: String,
    pub status: String,
    #[serde(default)]
    pub gates: Vec<GateResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary {
    pub allowed_prefixes: Vec<String>,
    pub touched_paths: Vec<String>,
    pub out_of_boundary: Vec<String>,
    pub compliant: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub run_id: String,
    pub orchestrator: String,
    pub runtime: String,
    pub phase: Phase,
    pub source_issue: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub external_ids: Vec<String>,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfReview {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub self_review: SelfReview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationStatement {
    pub intent: Intent,
    pub plan: Plan,
    pub execution: Execution,
    pub boundary: Boundary,
    pub verification: Verification,
    pub provenance: Provenance,
    pub trace: Trace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}
