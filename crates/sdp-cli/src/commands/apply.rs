//! §6 `apply` verb: run every workstream for a feature outside the phased
//! FSM, for scripted and CI-driven use.

use super::common::{load_environment, to_utf8};
use crate::args::Cli;
use crate::error::CliError;
use async_trait::async_trait;
use camino::Utf8Path;
use chrono::Utc;
use sdp_checkpoint::{Checkpoint, WorkstreamState, WorkstreamStatus as CheckpointWorkstreamStatus};
use sdp_executor::deps::WorkstreamTask;
use sdp_executor::evidence::RecordingWriter;
use sdp_executor::progress::{ProgressMode, WriterSink};
use sdp_executor::retry::RetryPolicy;
use sdp_executor::{apply as run_apply, WorkstreamRunner};
use sdp_packet::{
    build_provenance, context_packet_path, hydrate, write_context_packet, write_provenance, DependencyResolver,
    SourceCandidate, SourceType,
};
use sdp_phases::WorkerInvocation;
use sdp_runner::{run, CommandSpec};
use sdp_utils::identifiers::{FeatureId, WorkstreamId};
use sdp_workstream::{discover, WorkstreamSpec};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct ApplyRunner<'a> {
    project_root: &'a Utf8Path,
    agents_doc_path: &'a Utf8Path,
    skill_doc_path: Option<&'a Utf8Path>,
    worker: &'a WorkerInvocation,
    resolver: &'a dyn DependencyResolver,
    specs: BTreeMap<WorkstreamId, WorkstreamSpec>,
    checkpoint: Mutex<Checkpoint>,
    timeout: Duration,
}

#[async_trait]
impl WorkstreamRunner for ApplyRunner<'_> {
    async fn run(&self, ws_id: &WorkstreamId, cancel: &CancellationToken) -> Result<(), String> {
        let spec = self.specs.get(ws_id).ok_or_else(|| format!("no workstream spec found for {ws_id}"))?;
        let drift_status = capture_drift_status(self.project_root, cancel).await;

        let packet = {
            let checkpoint = self.checkpoint.lock().await;
            hydrate(
                std::slice::from_ref(spec),
                &checkpoint,
                &read_or_empty(self.agents_doc_path),
                &drift_status,
                self.resolver,
            )
            .map_err(|e| e.to_string())?
        };
        write_context_packet(self.project_root, &packet).map_err(|e| e.to_string())?;

        let prompt = serde_json::to_string_pretty(&packet).map_err(|e| e.to_string())?;
        write_provenance_record(self.project_root, self.agents_doc_path, self.skill_doc_path, &prompt).map_err(|e| e.to_string())?;

        let command = self.worker.build_command();
        let cancel_fut = async move { cancel.cancelled().await };
        let outcome = run(&command, Some(prompt.as_bytes()), self.timeout, cancel_fut).await.map_err(|e| e.to_string())?;
        if !outcome.success() {
            return Err(format!("worker exited with non-zero status for {ws_id}"));
        }

        let mut checkpoint = self.checkpoint.lock().await;
        if let Some(status) = checkpoint.workstream_mut(ws_id) {
            status.status = WorkstreamState::Done;
            status.attempts += 1;
        }
        Ok(())
    }
}

fn read_or_empty(path: &Utf8Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

async fn capture_drift_status(project_root: &Utf8Path, cancel: &CancellationToken) -> String {
    let spec = CommandSpec::new("git").arg("-C").arg(project_root.as_str()).arg("status").arg("--porcelain");
    let cancel_fut = async move { cancel.cancelled().await };
    match run(&spec, None, Duration::from_secs(10), cancel_fut).await {
        Ok(out) if out.success() => out.combined_output,
        _ => String::new(),
    }
}

fn write_provenance_record(
    project_root: &Utf8Path,
    agents_doc_path: &Utf8Path,
    skill_doc_path: Option<&Utf8Path>,
    prompt: &str,
) -> Result<(), sdp_packet::ProvenanceError> {
    let packet_path = context_packet_path(project_root);
    let mut candidates = vec![
        SourceCandidate {
            source_type: SourceType::ContextPacket,
            relative_path: packet_path.to_string(),
            absolute_path: &packet_path,
        },
        SourceCandidate {
            source_type: SourceType::AgentsMd,
            relative_path: agents_doc_path.to_string(),
            absolute_path: agents_doc_path,
        },
    ];
    if let Some(skill) = skill_doc_path {
        candidates.push(SourceCandidate {
            source_type: SourceType::Skill,
            relative_path: skill.to_string(),
            absolute_path: skill,
        });
    }
    let provenance = build_provenance(prompt.as_bytes(), &candidates);
    write_provenance(project_root, &provenance)?;
    Ok(())
}

pub async fn execute(cli: &Cli, project_root: &Utf8Path, feature_id: &str, json: bool) -> Result<(), CliError> {
    let feature = FeatureId::parse(feature_id)?;
    let env = load_environment(project_root, cli)?;
    let workstreams = discover(project_root, feature_id)?;

    let checkpoint = Checkpoint::init(feature.clone(), cli.branch_base.clone(), Utc::now());
    let mut checkpoint = checkpoint;
    checkpoint.workstreams = workstreams.iter().map(|w| CheckpointWorkstreamStatus::pending(w.ws_id.clone())).collect();

    let specs: BTreeMap<WorkstreamId, WorkstreamSpec> = workstreams.iter().map(|w| (w.ws_id.clone(), w.clone())).collect();
    let tasks: Vec<WorkstreamTask> = workstreams.iter().map(|w| WorkstreamTask::ok(w.ws_id.clone(), w.depends_on.clone())).collect();

    let agents_doc_path = to_utf8(&cli.agents_doc);
    let skill_doc_path = cli.skill_doc.as_deref().map(to_utf8);
    let runner = ApplyRunner {
        project_root,
        agents_doc_path: &agents_doc_path,
        skill_doc_path: skill_doc_path.as_deref(),
        worker: &env.worker,
        resolver: &env.resolver,
        specs,
        checkpoint: Mutex::new(checkpoint),
        timeout: Duration::from_secs(env.config.timeouts.build_secs),
    };

    let retry_policy = RetryPolicy::new(env.config.retry.max_retries, Duration::from_secs(env.config.retry.delay_secs));
    let cancel = CancellationToken::new();
    let mode = if json { ProgressMode::Json } else { ProgressMode::Human };
    let mut sink = WriterSink { mode, writer: std::io::stdout() };
    let evidence = RecordingWriter::default();

    let outcome = run_apply(tasks, &runner, retry_policy, &cancel, &mut sink, &evidence, Utc::now).await?;
    for warning in &outcome.warnings {
        eprintln!("warning: {} failed to parse dependencies: {}", warning.id, warning.reason);
    }
    println!(
        "{} succeeded, {} failed, {} retries, {:?} elapsed",
        outcome.summary.succeeded, outcome.summary.failed, outcome.summary.total_retries, outcome.summary.wall_clock
    );
    Ok(())
}
