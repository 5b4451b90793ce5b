//! The binary's own error wrapper: folds the CLI's error union into one
//! root type, renders it with [`UserFriendlyError`], and maps it onto the
//! named process exit codes.

use sdp_utils::exit_codes::ExitCode;
use std::fmt;

#[derive(Debug)]
pub enum ErrorCategory {
    Configuration,
    Identifier,
    Discovery,
    Hydration,
    ScopeBoundary,
    FsmTransition,
    Subprocess,
    Hook,
    Attestation,
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Identifier => "identifier",
            ErrorCategory::Discovery => "workstream discovery",
            ErrorCategory::Hydration => "context hydration",
            ErrorCategory::ScopeBoundary => "scope boundary",
            ErrorCategory::FsmTransition => "phase transition",
            ErrorCategory::Subprocess => "subprocess",
            ErrorCategory::Hook => "hook",
            ErrorCategory::Attestation => "attestation",
            ErrorCategory::Other => "other",
        };
        f.write_str(label)
    }
}

/// A rich, user-facing rendering of a failure: a one-line message, optional
/// extra context, and actionable suggestions, alongside the category used
/// to pick a process exit code.
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn context(&self) -> Option<String>;
    fn suggestions(&self) -> Vec<String>;
    fn category(&self) -> ErrorCategory;
}

#[derive(Debug, thiserror::Error)]
pub enum XCheckerError {
    #[error(transparent)]
    Cli(#[from] sdp_cli::CliError),
}

impl XCheckerError {
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            XCheckerError::Cli(e) => cli_error_exit_code(e),
        }
    }
}

fn cli_error_exit_code(error: &sdp_cli::error::CliError) -> ExitCode {
    use sdp_cli::error::CliError;

    match error {
        CliError::Identifier(_) => ExitCode::IdentifierError,
        CliError::Config(_) | CliError::HooksLoad(_) | CliError::ConstraintsLoad(_) | CliError::ConstraintEngine(_) => {
            ExitCode::IdentifierError
        }
        CliError::TrackerMapping(_) | CliError::FeatureNotInitialized(_) | CliError::RunLogNotFound(_) => ExitCode::IdentifierError,
        CliError::Discovery(_) => ExitCode::HydrationError,
        CliError::Executor(sdp_executor::ExecutorError::Cycle(_)) => ExitCode::HydrationError,
        CliError::Orchestrator(e) => orchestrator_error_exit_code(e),
        CliError::Status(sdp_status::StatusError::Config(_)) => ExitCode::IdentifierError,
        CliError::Status(sdp_status::StatusError::Checkpoint(_)) => ExitCode::Other,
        CliError::Checkpoint(_) => ExitCode::Other,
        CliError::ContractGenerate(_) | CliError::ContractValidate(_) | CliError::ContractValidationFailed(_) => ExitCode::Other,
        CliError::Io(_) | CliError::Json(_) => ExitCode::Other,
    }
}

fn orchestrator_error_exit_code(error: &sdp_orchestrator::OrchestratorError) -> ExitCode {
    use sdp_orchestrator::OrchestratorError;

    match error {
        OrchestratorError::Fsm(_) => ExitCode::FsmViolation,
        OrchestratorError::Discovery(_) => ExitCode::HydrationError,
        OrchestratorError::Checkpoint(_) | OrchestratorError::RunLog(_) => ExitCode::Other,
        OrchestratorError::Hook(_) => ExitCode::SubprocessError,
        OrchestratorError::Build(build_err) => build_error_exit_code(build_err),
        OrchestratorError::Review(review_err) => review_error_exit_code(review_err),
        OrchestratorError::Publish(publish_err) => publish_error_exit_code(publish_err),
        OrchestratorError::Ci(ci_err) => ci_error_exit_code(ci_err),
        OrchestratorError::AttestationWrite(_) => ExitCode::Other,
        OrchestratorError::MissingPublishCommands | OrchestratorError::MissingCiCommands | OrchestratorError::MissingPrNumber => {
            ExitCode::Other
        }
        OrchestratorError::Cancelled => ExitCode::Other,
    }
}

fn build_error_exit_code(error: &sdp_phases::BuildError) -> ExitCode {
    use sdp_phases::BuildError;

    match error {
        BuildError::Hydration(_) | BuildError::Provenance(_) => ExitCode::HydrationError,
        BuildError::Hook(_) => ExitCode::SubprocessError,
        BuildError::Worker { source, .. } => runner_error_exit_code(source),
        BuildError::ConstraintHalt { .. } => ExitCode::ScopeViolation,
        BuildError::Cancelled => ExitCode::Other,
    }
}

fn runner_error_exit_code(error: &sdp_runner::RunnerError) -> ExitCode {
    use sdp_runner::RunnerError;

    match error {
        RunnerError::Timeout { .. } => ExitCode::PhaseTimeout,
        RunnerError::Spawn { .. } | RunnerError::NonZeroExit { .. } => ExitCode::SubprocessError,
        RunnerError::Cancelled { .. } => ExitCode::Other,
    }
}

fn review_error_exit_code(error: &sdp_phases::ReviewError) -> ExitCode {
    use sdp_phases::ReviewError;

    match error {
        ReviewError::Hydration(_) | ReviewError::Provenance(_) => ExitCode::HydrationError,
        ReviewError::Hook(_) => ExitCode::SubprocessError,
        ReviewError::Worker(source) => runner_error_exit_code(source),
        ReviewError::NonZeroExit => ExitCode::SubprocessError,
    }
}

fn publish_error_exit_code(error: &sdp_phases::PublishError) -> ExitCode {
    use sdp_phases::PublishError;

    match error {
        PublishError::Hook(_) => ExitCode::SubprocessError,
        PublishError::Push(source) | PublishError::PrCreate(source) => runner_error_exit_code(source),
        PublishError::MalformedResponse(_) => ExitCode::SubprocessError,
    }
}

fn ci_error_exit_code(error: &sdp_phases::CiError) -> ExitCode {
    use sdp_phases::CiError;

    match error {
        CiError::Hook(_) => ExitCode::SubprocessError,
        CiError::Delegate(source) => runner_error_exit_code(source),
    }
}

impl UserFriendlyError for XCheckerError {
    fn user_message(&self) -> String {
        match self {
            XCheckerError::Cli(e) => e.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            XCheckerError::Cli(sdp_cli::CliError::FeatureNotInitialized(feature)) => {
                vec![format!("run `xchecker init {feature}` first")]
            }
            XCheckerError::Cli(sdp_cli::CliError::RunLogNotFound(feature)) => {
                vec![format!("the feature may have been initialized under a different --runs-dir; check that {feature}'s run log is still on disk")]
            }
            XCheckerError::Cli(sdp_cli::CliError::Orchestrator(sdp_orchestrator::OrchestratorError::MissingPublishCommands)) => {
                vec!["publish commands are wired in by the CLI layer; this indicates a configuration bug".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            XCheckerError::Cli(e) => cli_error_category(e),
        }
    }
}

fn cli_error_category(error: &sdp_cli::error::CliError) -> ErrorCategory {
    use sdp_cli::error::CliError;

    match error {
        CliError::Identifier(_) => ErrorCategory::Identifier,
        CliError::Config(_) | CliError::HooksLoad(_) | CliError::ConstraintsLoad(_) | CliError::ConstraintEngine(_) => {
            ErrorCategory::Configuration
        }
        CliError::TrackerMapping(_) | CliError::FeatureNotInitialized(_) | CliError::RunLogNotFound(_) => ErrorCategory::Configuration,
        CliError::Discovery(_) | CliError::Executor(_) => ErrorCategory::Discovery,
        CliError::Orchestrator(_) => ErrorCategory::FsmTransition,
        CliError::Checkpoint(_) | CliError::Status(_) => ErrorCategory::Other,
        CliError::ContractGenerate(_) | CliError::ContractValidate(_) | CliError::ContractValidationFailed(_) => ErrorCategory::Other,
        CliError::Io(_) | CliError::Json(_) => ErrorCategory::Other,
    }
}
