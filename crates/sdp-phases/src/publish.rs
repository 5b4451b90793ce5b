//! §4.9 Publish phase: push the branch, open a pull request, record its
//! number and URL on the checkpoint.

use crate::PhaseEnv;
use chrono::{DateTime, Utc};
use sdp_checkpoint::Checkpoint;
use sdp_hooks::{run_hook, HookError, HookKind};
use sdp_phase_api::Phase;
use sdp_runner::{run_checked, CommandSpec, RunnerError};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("failed to push branch: {0}")]
    Push(#[source] RunnerError),
    #[error("failed to create pull request: {0}")]
    PrCreate(#[source] RunnerError),
    #[error("pull request tool output could not be parsed as JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// The platform CLI invocation this phase runs: a push command and a PR
/// creation command whose combined stdout is expected to be a JSON object
/// with `number` and `url` fields (the shape `gh pr create --json
/// number,url` produces).
pub struct PublishConfig<'a> {
    pub push: &'a CommandSpec,
    pub pr_create: &'a CommandSpec,
}

#[derive(Debug, Deserialize)]
struct PrResponse {
    number: u64,
    url: String,
}

pub async fn run_publish(
    checkpoint: &mut Checkpoint,
    env: &PhaseEnv<'_>,
    publish: &PublishConfig<'_>,
    timeout: Duration,
    cancel: &CancellationToken,
    now: impl Fn() -> DateTime<Utc>,
) -> Result<(), PublishError> {
    run_phase_hook(HookKind::PrePr, env, cancel).await?;

    run_checked(publish.push, None, timeout, wait_for_cancel(cancel))
        .await
        .map_err(PublishError::Push)?;

    let outcome = run_checked(publish.pr_create, None, timeout, wait_for_cancel(cancel))
        .await
        .map_err(PublishError::PrCreate)?;

    let response: PrResponse =
        serde_json::from_str(outcome.combined_output.trim()).map_err(PublishError::MalformedResponse)?;

    checkpoint.pr_number = Some(response.number);
    checkpoint.pr_url = Some(response.url);
    checkpoint.updated_at = now();

    run_phase_hook(HookKind::PostPr, env, cancel).await?;
    Ok(())
}

async fn run_phase_hook(kind: HookKind, env: &PhaseEnv<'_>, cancel: &CancellationToken) -> Result<(), HookError> {
    let Some(spec) = env.hooks.get(kind) else {
        return Ok(());
    };
    run_hook(kind, spec, Phase::Pr, &env.feature_id, None, wait_for_cancel(cancel)).await?;
    Ok(())
}

fn wait_for_cancel(cancel: &CancellationToken) -> impl std::future::Future<Output = ()> + '_ {
    async move { cancel.cancelled().await }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pr_response_json() {
        let response: PrResponse = serde_json::from_str(r#"{"number": 42, "url": "https://example.com/pr/42"}"#).unwrap();
        assert_eq!(response.number, 42);
        assert_eq!(response.url, "https://example.com/pr/42");
    }
}
