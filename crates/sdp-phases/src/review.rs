//! §4.9 Review phase.

use crate::PhaseEnv;
use chrono::{DateTime, Utc};
use sdp_checkpoint::{Checkpoint, ReviewState, ReviewStatus};
use sdp_hooks::{run_hook, HookError, HookKind};
use sdp_packet::{
    build_provenance, context_packet_path, hydrate, write_context_packet, write_provenance, HydrationError,
    ProvenanceError, SourceCandidate, SourceType,
};
use sdp_phase_api::Phase;
use sdp_runner::{run, RunnerError};
use sdp_workstream::WorkstreamSpec;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Hydration(#[from] HydrationError),
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("review worker invocation failed: {0}")]
    Worker(#[from] RunnerError),
    #[error("review worker exited non-zero")]
    NonZeroExit,
}

/// Hydrate the feature-level context (every supplied workstream spec
/// concatenated), invoke the review worker, and record approval based on a
/// zero exit plus a case-insensitive `APPROVED` token in its output.
pub async fn run_review(
    workstreams: &[WorkstreamSpec],
    checkpoint: &mut Checkpoint,
    env: &PhaseEnv<'_>,
    timeout: Duration,
    cancel: &CancellationToken,
    now: impl Fn() -> DateTime<Utc>,
) -> Result<(), ReviewError> {
    run_phase_hook(HookKind::PreReview, env, cancel).await?;

    let agents_doc = std::fs::read_to_string(env.agents_doc_path).unwrap_or_default();
    let packet = hydrate(workstreams, checkpoint, &agents_doc, "", env.tracker)?;
    write_context_packet(env.project_root, &packet)?;

    let prompt = serde_json::to_string_pretty(&packet).unwrap_or_default();
    write_provenance_record(env, &prompt)?;

    let command = env.worker.review_command();
    let cancel_fut = async { cancel.cancelled().await };
    let outcome = run(&command, Some(prompt.as_bytes()), timeout, cancel_fut).await?;

    let approved = outcome.success() && outcome.combined_output.to_uppercase().contains("APPROVED");

    let iteration = checkpoint.review.as_ref().map(|r| r.iteration + 1).unwrap_or(1);
    checkpoint.review = Some(ReviewStatus {
        iteration,
        status: if approved { ReviewState::Approved } else { ReviewState::Pending },
        verdict_ref: None,
    });
    checkpoint.updated_at = now();

    run_phase_hook(HookKind::PostReview, env, cancel).await?;

    if !outcome.success() {
        return Err(ReviewError::NonZeroExit);
    }
    Ok(())
}

async fn run_phase_hook(kind: HookKind, env: &PhaseEnv<'_>, cancel: &CancellationToken) -> Result<(), HookError> {
    let Some(spec) = env.hooks.get(kind) else {
        return Ok(());
    };
    let cancel_fut = async { cancel.cancelled().await };
    run_hook(kind, spec, Phase::Review, &env.feature_id, None, cancel_fut).await?;
    Ok(())
}

fn write_provenance_record(env: &PhaseEnv<'_>, prompt: &str) -> Result<(), ReviewError> {
    let packet_path = context_packet_path(env.project_root);
    let mut candidates = vec![
        SourceCandidate {
            source_type: SourceType::ContextPacket,
            relative_path: packet_path.to_string(),
            absolute_path: &packet_path,
        },
        SourceCandidate {
            source_type: SourceType::AgentsMd,
            relative_path: env.agents_doc_path.to_string(),
            absolute_path: env.agents_doc_path,
        },
    ];
    if let Some(skill) = env.skill_doc_path {
        candidates.push(SourceCandidate {
            source_type: SourceType::Skill,
            relative_path: skill.to_string(),
            absolute_path: skill,
        });
    }
    let provenance = build_provenance(prompt.as_bytes(), &candidates);
    write_provenance(env.project_root, &provenance)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn approval_requires_zero_exit_and_token() {
        let combined_success_with_token = true && "worker output: APPROVED".to_uppercase().contains("APPROVED");
        assert!(combined_success_with_token);
        let combined_success_without_token = true && "looks fine".to_uppercase().contains("APPROVED");
        assert!(!combined_success_without_token);
    }
}
