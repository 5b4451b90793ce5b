//! §4.9 Build phase.

use crate::PhaseEnv;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use sdp_checkpoint::{Checkpoint, WorkstreamState};
use sdp_constraints::{Check, ConstraintEngine};
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

const COMMIT_HEX_LEN: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Hydration(#[from] HydrationError),
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("worker invocation failed for {workstream}: {source}")]
    Worker {
        workstream: String,
        #[source]
        source: RunnerError,
    },
    #[error("build phase halted by constraint {constraint_id} for {workstream}")]
    ConstraintHalt { constraint_id: String, workstream: String },
    #[error("build phase cancelled")]
    Cancelled,
}

/// Run every non-`done` workstream in `workstreams` (already topologically
/// ordered) against the worker, recording commits and advancing checkpoint
/// status as each completes. The last post-build hook only runs once every
/// supplied workstream has reached `done`.
pub async fn run_build(
    workstreams: &[WorkstreamSpec],
    checkpoint: &mut Checkpoint,
    env: &PhaseEnv<'_>,
    constraints: Option<&mut ConstraintEngine>,
    timeout: Duration,
    cancel: &CancellationToken,
    now: impl Fn() -> DateTime<Utc>,
) -> Result<(), BuildError> {
    let mut constraints = constraints;
    let done: std::collections::HashSet<&sdp_utils::identifiers::WorkstreamId> = checkpoint
        .workstreams
        .iter()
        .filter(|w| w.status == WorkstreamState::Done)
        .map(|w| &w.id)
        .collect();
    let pending: Vec<&WorkstreamSpec> = workstreams.iter().filter(|s| !done.contains(&s.ws_id)).collect();

    for (idx, spec) in pending.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        run_phase_hook(HookKind::PreBuild, env, Phase::Build, Some(spec.ws_id.as_str()), cancel).await?;

        let drift_status = capture_drift_status(env.project_root, cancel).await;
        let packet = hydrate(
            std::slice::from_ref(*spec),
            checkpoint,
            &read_or_empty(env.agents_doc_path),
            &drift_status,
            env.tracker,
        )?;
        write_context_packet(env.project_root, &packet)?;

        let prompt = render_prompt(&packet);
        write_provenance_record(env, &prompt)?;

        let command = env.worker.build_command();
        if let Some(engine) = constraints.as_deref_mut() {
            let argv = format!("{} {}", command.program, command.args.join(" "));
            let violations = engine.evaluate(Phase::Build, &Check::Command(&argv));
            if let Some(halted) = halted_by(&violations) {
                return Err(BuildError::ConstraintHalt {
                    constraint_id: halted,
                    workstream: spec.ws_id.to_string(),
                });
            }
        }

        let cancel_fut = wait_for_cancel(cancel);
        let outcome = run(&command, Some(prompt.as_bytes()), timeout, cancel_fut)
            .await
            .map_err(|source| BuildError::Worker {
                workstream: spec.ws_id.to_string(),
                source,
            })?;

        let commit = parse_commit(&outcome.combined_output);
        if commit.is_none() {
            tracing::warn!(workstream = %spec.ws_id, "worker output did not end with a commit identifier");
        }

        if let Some(status) = checkpoint.workstream_mut(&spec.ws_id) {
            status.status = WorkstreamState::Done;
            status.commit = commit;
            status.attempts += 1;
        }

        if idx == pending.len() - 1 {
            run_phase_hook(HookKind::PostBuild, env, Phase::Build, None, cancel).await?;
        }
    }

    checkpoint.updated_at = now();
    Ok(())
}

fn halted_by(violations: &[sdp_constraints::Violation]) -> Option<String> {
    violations
        .iter()
        .find(|v| matches!(v.severity, sdp_constraints::Severity::Halt))
        .map(|v| v.constraint_id.clone())
}

async fn run_phase_hook(
    kind: HookKind,
    env: &PhaseEnv<'_>,
    phase: Phase,
    workstream_id: Option<&str>,
    cancel: &CancellationToken,
) -> Result<(), HookError> {
    let Some(spec) = env.hooks.get(kind) else {
        return Ok(());
    };
    run_hook(kind, spec, phase, &env.feature_id, workstream_id, wait_for_cancel(cancel)).await?;
    Ok(())
}

fn wait_for_cancel(cancel: &CancellationToken) -> impl std::future::Future<Output = ()> + '_ {
    async move { cancel.cancelled().await }
}

async fn capture_drift_status(project_root: &Utf8Path, cancel: &CancellationToken) -> String {
    let spec = sdp_runner::CommandSpec::new("git").arg("-C").arg(project_root.as_str()).arg("status").arg("--porcelain");
    match run(&spec, None, Duration::from_secs(10), wait_for_cancel(cancel)).await {
        Ok(out) if out.success() => out.combined_output,
        _ => String::new(),
    }
}

fn read_or_empty(path: &Utf8Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

fn render_prompt(packet: &sdp_packet::ContextPacket) -> String {
    serde_json::to_string_pretty(packet).unwrap_or_default()
}

fn write_provenance_record(env: &PhaseEnv<'_>, prompt: &str) -> Result<(), BuildError> {
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

/// Best-effort: the last non-blank line of worker output, if it is exactly
/// forty hex characters.
fn parse_commit(output: &str) -> Option<String> {
    let last = output.lines().rev().find(|l| !l.trim().is_empty())?.trim();
    (last.len() == COMMIT_HEX_LEN && last.bytes().all(|b| b.is_ascii_hexdigit())).then(|| last.to_string())
}
