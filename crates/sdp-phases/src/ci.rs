//! §4.9 CI phase: delegate to the external CI-loop tool, then advance.

use crate::PhaseEnv;
use chrono::{DateTime, Utc};
use sdp_checkpoint::Checkpoint;
use sdp_hooks::{run_hook, HookError, HookKind};
use sdp_phase_api::Phase;
use sdp_runner::{run_checked, CommandSpec, RunnerError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum CiError {
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("CI-loop delegate failed: {0}")]
    Delegate(#[source] RunnerError),
}

/// The CI-loop delegate invocation, pre-built by the caller with the PR
/// number, feature id, checkpoint directory and run-file directory already
/// embedded as argv elements.
pub struct CiConfig<'a> {
    pub ci_loop: &'a CommandSpec,
}

pub async fn run_ci(
    checkpoint: &mut Checkpoint,
    env: &PhaseEnv<'_>,
    ci: &CiConfig<'_>,
    timeout: Duration,
    cancel: &CancellationToken,
    now: impl Fn() -> DateTime<Utc>,
) -> Result<(), CiError> {
    run_phase_hook(HookKind::PreCi, env, cancel).await?;

    run_checked(ci.ci_loop, None, timeout, wait_for_cancel(cancel))
        .await
        .map_err(CiError::Delegate)?;

    checkpoint.updated_at = now();

    run_phase_hook(HookKind::PostCi, env, cancel).await?;
    Ok(())
}

async fn run_phase_hook(kind: HookKind, env: &PhaseEnv<'_>, cancel: &CancellationToken) -> Result<(), HookError> {
    let Some(spec) = env.hooks.get(kind) else {
        return Ok(());
    };
    run_hook(kind, spec, Phase::Ci, &env.feature_id, None, wait_for_cancel(cancel)).await?;
    Ok(())
}

fn wait_for_cancel(cancel: &CancellationToken) -> impl std::future::Future<Output = ()> + '_ {
    async move { cancel.cancelled().await }
}
