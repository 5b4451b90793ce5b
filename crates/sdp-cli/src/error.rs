//! The CLI's own error union: every subsystem error the command layer can
//! surface, folded into one enum via `#[from]` so `?` works uniformly
//! across `commands/*`. Richer, exit-code-aware rendering lives one layer
//! up, in the binary crate, which matches into these variants.

use sdp_utils::identifiers::IdentifierError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Config(#[from] sdp_config::ConfigError),
    #[error(transparent)]
    HooksLoad(#[from] sdp_hooks::HooksLoadError),
    #[error(transparent)]
    ConstraintsLoad(#[from] sdp_constraints::ConstraintsLoadError),
    #[error(transparent)]
    ConstraintEngine(#[from] sdp_constraints::ConstraintError),
    #[error(transparent)]
    TrackerMapping(#[from] crate::tracker::TrackerMappingError),
    #[error(transparent)]
    Checkpoint(#[from] sdp_checkpoint::CheckpointError),
    #[error(transparent)]
    Discovery(#[from] sdp_workstream::DiscoveryError),
    #[error(transparent)]
    Orchestrator(#[from] sdp_orchestrator::OrchestratorError),
    #[error(transparent)]
    Executor(#[from] sdp_executor::ExecutorError),
    #[error(transparent)]
    ContractGenerate(#[from] sdp_contracts::GenerateError),
    #[error(transparent)]
    ContractValidate(#[from] sdp_contracts::ValidateError),
    #[error(transparent)]
    Status(#[from] sdp_status::StatusError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("feature {0} has not been initialized; run `init` first")]
    FeatureNotInitialized(String),
    #[error("no run log found for feature {0} under the configured runs directory")]
    RunLogNotFound(String),
    #[error("contract validation found {0} error-severity violation(s)")]
    ContractValidationFailed(usize),
}
