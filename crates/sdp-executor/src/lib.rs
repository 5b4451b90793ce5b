//! §4.12 Executor ("apply"): runs workstreams outside the phased FSM, for
//! scripted and CI-driven use. Wires together dependency parsing,
//! topological ordering, bounded retries, progress reporting and evidence
//! emission around a caller-supplied [`WorkstreamRunner`].

pub mod deps;
pub mod evidence;
pub mod progress;
pub mod retry;
pub mod topo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deps::{parse_dependencies, DependencyParseWarning, WorkstreamTask};
use evidence::{EvidenceEvent, EvidenceKind, EvidenceWriter};
use progress::{ProgressEvent, ProgressSink, RunSummary, WorkstreamStatus as ProgressStatus};
use retry::{retry, RetryError, RetryPolicy};
use sdp_utils::identifiers::WorkstreamId;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Cycle(#[from] topo::CycleError),
}

/// A single workstream execution, supplied by the caller. `cancel` is the
/// same token the executor itself observes, so a long-running runner can
/// check it mid-invocation.
#[async_trait]
pub trait WorkstreamRunner: Send + Sync {
    async fn run(&self, ws_id: &WorkstreamId, cancel: &CancellationToken) -> Result<(), String>;
}

pub struct ApplyOutcome {
    pub summary: RunSummary,
    pub warnings: Vec<DependencyParseWarning>,
}

/// Run every task in `tasks` in dependency order, retrying each per
/// `retry_policy`, reporting progress through `progress` and emitting the
/// four canonical evidence events through `evidence`. Stops issuing new
/// workstreams once `cancel` fires but still returns a summary for whatever
/// ran.
#[allow(clippy::too_many_arguments)]
pub async fn apply(
    tasks: Vec<WorkstreamTask>,
    runner: &dyn WorkstreamRunner,
    retry_policy: RetryPolicy,
    cancel: &CancellationToken,
    progress: &mut dyn ProgressSink,
    evidence: &dyn EvidenceWriter,
    clock: impl Fn() -> DateTime<Utc>,
) -> Result<ApplyOutcome, ExecutorError> {
    let nodes: Vec<WorkstreamId> = tasks.iter().map(|t| t.id.clone()).collect();
    let (edges, warnings) = parse_dependencies(&tasks);
    let order = topo::topological_sort(&nodes, &edges)?;

    let started = Instant::now();
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut total_retries = 0u32;

    for ws_id in &order {
        if cancel.is_cancelled() {
            break;
        }

        progress.emit(&ProgressEvent::new(ws_id.to_string(), ProgressStatus::Running, 0, "starting", clock()));

        let mut payload = BTreeMap::new();
        payload.insert("ws_id".to_string(), ws_id.to_string());
        emit_evidence(evidence, ws_id, EvidenceKind::Plan, &payload, clock()).await;

        let outcome = retry(retry_policy, cancel, |_attempt| runner.run(ws_id, cancel)).await;

        match outcome {
            Ok(o) => {
                succeeded += 1;
                total_retries += o.retries;
                progress.emit(&ProgressEvent::new(ws_id.to_string(), ProgressStatus::Succeeded, 100, "done", clock()));
                emit_evidence(evidence, ws_id, EvidenceKind::Generation, &payload, clock()).await;
                emit_evidence(evidence, ws_id, EvidenceKind::Verification, &payload, clock()).await;
                emit_evidence(evidence, ws_id, EvidenceKind::Approval, &payload, clock()).await;
            }
            Err(RetryError::Cancelled) => {
                failed += 1;
                progress.emit(&ProgressEvent::new(ws_id.to_string(), ProgressStatus::Failed, 0, "cancelled", clock()));
                break;
            }
            Err(RetryError::Exhausted { attempts, source }) => {
                failed += 1;
                total_retries += attempts.saturating_sub(1);
                progress.emit(&ProgressEvent::new(
                    ws_id.to_string(),
                    ProgressStatus::Failed,
                    0,
                    format!("failed after {attempts} attempt(s): {source}"),
                    clock(),
                ));
            }
        }
    }

    Ok(ApplyOutcome {
        summary: RunSummary {
            total: order.len(),
            succeeded,
            failed,
            total_retries,
            wall_clock: started.elapsed(),
        },
        warnings,
    })
}

async fn emit_evidence(
    evidence: &dyn EvidenceWriter,
    ws_id: &WorkstreamId,
    kind: EvidenceKind,
    payload: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) {
    let event = EvidenceEvent::new(ws_id.to_string(), kind, now, payload.clone());
    if let Err(e) = evidence.write_event(&event).await {
        tracing::warn!(ws_id = %ws_id, kind = ?kind, error = %e, "evidence writer failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence::RecordingWriter;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn id(s: &str) -> WorkstreamId {
        WorkstreamId::parse(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-07-27T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    struct AlwaysOk;

    #[async_trait]
    impl WorkstreamRunner for AlwaysOk {
        async fn run(&self, _ws_id: &WorkstreamId, _cancel: &CancellationToken) -> Result<(), String> {
            Ok(())
        }
    }

    struct FailsThenSucceeds {
        calls: AtomicU32,
    }

    #[async_trait]
    impl WorkstreamRunner for FailsThenSucceeds {
        async fn run(&self, _ws_id: &WorkstreamId, _cancel: &CancellationToken) -> Result<(), String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err("transient".to_string())
            } else {
                Ok(())
            }
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl WorkstreamRunner for AlwaysFails {
        async fn run(&self, _ws_id: &WorkstreamId, _cancel: &CancellationToken) -> Result<(), String> {
            Err("broken".to_string())
        }
    }

    struct NullSink;
    impl ProgressSink for NullSink {
        fn emit(&mut self, _event: &ProgressEvent) {}
    }

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }
    impl ProgressSink for CollectingSink {
        fn emit(&mut self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn runs_in_dependency_order_and_reports_all_succeeded() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let tasks = vec![WorkstreamTask::ok(b.clone(), vec![a.clone()]), WorkstreamTask::ok(a, vec![])];
        let runner = AlwaysOk;
        let cancel = CancellationToken::new();
        let mut sink = NullSink;
        let writer = RecordingWriter::default();

        let outcome = apply(tasks, &runner, RetryPolicy::new(0, std::time::Duration::from_millis(1)), &cancel, &mut sink, &writer, now)
            .await
            .unwrap();

        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.succeeded, 2);
        assert_eq!(outcome.summary.failed, 0);
        assert!(outcome.warnings.is_empty());

        let events = writer.events().await;
        assert_eq!(events.len(), 8); // 4 canonical events per workstream
    }

    #[tokio::test]
    async fn retries_are_reflected_in_the_summary() {
        let a = id("00-016-01");
        let tasks = vec![WorkstreamTask::ok(a, vec![])];
        let runner = FailsThenSucceeds { calls: AtomicU32::new(0) };
        let cancel = CancellationToken::new();
        let mut sink = NullSink;
        let writer = RecordingWriter::default();

        let outcome = apply(tasks, &runner, RetryPolicy::new(2, std::time::Duration::from_millis(1)), &cancel, &mut sink, &writer, now)
            .await
            .unwrap();

        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.total_retries, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_count_as_failed() {
        let a = id("00-016-01");
        let tasks = vec![WorkstreamTask::ok(a, vec![])];
        let runner = AlwaysFails;
        let cancel = CancellationToken::new();
        let mut sink = CollectingSink::default();
        let writer = RecordingWriter::default();

        let outcome = apply(tasks, &runner, RetryPolicy::new(1, std::time::Duration::from_millis(1)), &cancel, &mut sink, &writer, now)
            .await
            .unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.succeeded, 0);
        let events = sink.events.into_inner().unwrap();
        assert!(events.iter().any(|e| e.status == ProgressStatus::Failed));
    }

    #[tokio::test]
    async fn dependency_parse_failure_is_reported_but_does_not_block_execution() {
        let a = id("00-016-01");
        let tasks = vec![WorkstreamTask::parse_failed(a, "malformed depends_on")];
        let runner = AlwaysOk;
        let cancel = CancellationToken::new();
        let mut sink = NullSink;
        let writer = RecordingWriter::default();

        let outcome = apply(tasks, &runner, RetryPolicy::default(), &cancel, &mut sink, &writer, now)
            .await
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.summary.succeeded, 1);
    }

    #[tokio::test]
    async fn cycle_is_reported_as_an_error() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let tasks = vec![WorkstreamTask::ok(a.clone(), vec![b.clone()]), WorkstreamTask::ok(b, vec![a])];
        let runner = AlwaysOk;
        let cancel = CancellationToken::new();
        let mut sink = NullSink;
        let writer = RecordingWriter::default();

        let err = apply(tasks, &runner, RetryPolicy::default(), &cancel, &mut sink, &writer, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Cycle(_)));
    }

    #[tokio::test]
    async fn cancellation_stops_before_remaining_workstreams_run() {
        let a = id("00-016-01");
        let b = id("00-016-02");
        let tasks = vec![WorkstreamTask::ok(a, vec![]), WorkstreamTask::ok(b, vec![])];
        let runner = AlwaysOk;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut sink = NullSink;
        let writer = RecordingWriter::default();

        let outcome = apply(tasks, &runner, RetryPolicy::default(), &cancel, &mut sink, &writer, now)
            .await
            .unwrap();
        assert_eq!(outcome.summary.succeeded, 0);
    }
}
