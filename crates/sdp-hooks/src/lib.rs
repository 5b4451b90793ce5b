//! §4.14 Hooks: pre/post-phase shell hooks, configured per phase.

mod document;

pub use document::{load, HooksDocument, HooksLoadError};

use sdp_phase_api::Phase;
use sdp_runner::{run, CommandSpec, RunnerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    PreBuild,
    PostBuild,
    PreReview,
    PostReview,
    PrePr,
    PostPr,
    PreCi,
    PostCi,
}

impl HookKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreBuild => "pre_build",
            Self::PostBuild => "post_build",
            Self::PreReview => "pre_review",
            Self::PostReview => "post_review",
            Self::PrePr => "pre_pr",
            Self::PostPr => "post_pr",
            Self::PreCi => "pre_ci",
            Self::PostCi => "post_ci",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    Warn,
    #[serde(alias = "fail")]
    Halt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookSpec {
    pub command: Vec<String>,
    #[serde(default = "default_on_fail")]
    pub on_fail: OnFail,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_on_fail() -> OnFail {
    OnFail::Warn
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub passed: bool,
    pub output: String,
    pub timed_out: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook {kind} for phase {phase} failed: {reason}")]
    Failed {
        kind: &'static str,
        phase: Phase,
        reason: String,
    },
    #[error("hook {kind} for phase {phase} was cancelled")]
    Cancelled { kind: &'static str, phase: Phase },
}

/// Run one configured hook, honoring its `on_fail` policy. A `warn` hook
/// that fails (non-zero exit or timeout) logs and returns `passed = false`
/// without error; a `halt` hook that fails returns [`HookError::Failed`].
pub async fn run_hook(
    kind: HookKind,
    spec: &HookSpec,
    phase: Phase,
    feature_id: &str,
    workstream_id: Option<&str>,
    cancel: impl std::future::Future<Output = ()>,
) -> Result<HookOutcome, HookError> {
    let Some((program, args)) = spec.command.split_first() else {
        return Ok(HookOutcome {
            passed: true,
            output: String::new(),
            timed_out: false,
        });
    };

    let mut command = CommandSpec::new(program.clone())
        .args(args.iter().cloned())
        .env("SDP_FEATURE_ID", feature_id)
        .env("SDP_PHASE", phase.to_string())
        .env("SDP_HOOK_KIND", kind.as_str());
    if let Some(ws) = workstream_id {
        command = command.env("SDP_WORKSTREAM_ID", ws);
    }

    let outcome = run(&command, None, Duration::from_secs(spec.timeout_secs), cancel).await;

    let (passed, output, timed_out) = match outcome {
        Ok(out) => (out.success(), out.combined_output, false),
        Err(RunnerError::Timeout { .. }) => (false, format!("hook timed out after {}s", spec.timeout_secs), true),
        Err(RunnerError::Cancelled { .. }) => {
            return Err(HookError::Cancelled { kind: kind.as_str(), phase });
        }
        Err(e) => (false, e.to_string(), false),
    };

    if !passed {
        tracing::warn!(hook = kind.as_str(), phase = %phase, timed_out, "hook reported failure");
        if matches!(spec.on_fail, OnFail::Halt) {
            return Err(HookError::Failed {
                kind: kind.as_str(),
                phase,
                reason: output.clone(),
            });
        }
    }

    Ok(HookOutcome { passed, output, timed_out })
}
