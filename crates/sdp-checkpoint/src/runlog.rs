//! §4.7 Run-log file: `<runsDir>/oneshot-<FeatureID>-<UTC-compact>.json`.
//!
//! Append-only and never rewritten in the sense of discarding history: new
//! events are added by rewriting the whole (small, phase-bounded) file in
//! place with the temp+rename pattern.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use sdp_phase_api::Phase;
use sdp_utils::identifiers::FeatureId;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RunLogError {
    #[error("failed to read run-log {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse run-log {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("failed to write run-log {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to serialize run-log: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub at: DateTime<Utc>,
    pub phase: Phase,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub run_id: String,
    pub feature_id: FeatureId,
    pub orchestrator: String,
    pub branch: String,
    pub started_at: DateTime<Utc>,
    pub events: Vec<RunEvent>,
    pub last_phase: Phase,
    pub last_state: String,
}

/// Compact UTC timestamp suitable for a run-log filename, e.g. `20260101T000000Z`.
#[must_use]
pub fn compact_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

#[must_use]
pub fn run_log_path(runs_dir: &Utf8Path, feature_id: &FeatureId, now: DateTime<Utc>) -> Utf8PathBuf {
    runs_dir.join(format!("oneshot-{feature_id}-{}.json", compact_timestamp(now)))
}

/// Create the run-log for a freshly initialized feature, with the initial
/// `init/ok` event.
pub fn create(
    runs_dir: &Utf8Path,
    feature_id: &FeatureId,
    orchestrator: &str,
    branch: &str,
    now: DateTime<Utc>,
) -> Result<(Utf8PathBuf, RunLog), RunLogError> {
    let path = run_log_path(runs_dir, feature_id, now);
    let run_id = format!("oneshot-{feature_id}-{}", compact_timestamp(now));
    let log = RunLog {
        run_id,
        feature_id: feature_id.clone(),
        orchestrator: orchestrator.to_string(),
        branch: branch.to_string(),
        started_at: now,
        events: vec![RunEvent {
            at: now,
            phase: Phase::Init,
            state: "init/ok".to_string(),
        }],
        last_phase: Phase::Init,
        last_state: "init/ok".to_string(),
    };
    write(&path, &log)?;
    Ok((path, log))
}

/// Append a new event to the run-log at `path`, rewriting it atomically.
pub fn append(path: &Utf8Path, phase: Phase, state: &str, now: DateTime<Utc>) -> Result<RunLog, RunLogError> {
    let bytes = std::fs::read(path).map_err(|source| RunLogError::Read {
        path: path.to_string(),
        source,
    })?;
    let mut log: RunLog = serde_json::from_slice(&bytes).map_err(|source| RunLogError::Parse {
        path: path.to_string(),
        source,
    })?;
    log.events.push(RunEvent {
        at: now,
        phase,
        state: state.to_string(),
    });
    log.last_phase = phase;
    log.last_state = state.to_string();
    write(path, &log)?;
    Ok(log)
}

fn write(path: &Utf8Path, log: &RunLog) -> Result<(), RunLogError> {
    let bytes = serde_json::to_vec_pretty(log)?;
    sdp_utils::atomic_write::write_atomic(path, &bytes).map_err(|source| RunLogError::Write {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn create_writes_initial_event() {
        let project = TestProject::new();
        let runs_dir = project.root.join("runs");
        let feature = FeatureId::parse("F016").unwrap();
        let (path, log) = create(&runs_dir, &feature, "xchecker", "feature/f016", now()).unwrap();
        assert!(path.exists());
        assert_eq!(log.events.len(), 1);
        assert_eq!(log.events[0].state, "init/ok");
        assert_eq!(log.last_state, "init/ok");
    }

    #[test]
    fn append_adds_event_and_updates_last() {
        let project = TestProject::new();
        let runs_dir = project.root.join("runs");
        let feature = FeatureId::parse("F016").unwrap();
        let (path, _log) = create(&runs_dir, &feature, "xchecker", "feature/f016", now()).unwrap();

        let later = now() + chrono::Duration::seconds(30);
        let log = append(&path, Phase::Build, "build/ok", later).unwrap();
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.last_phase, Phase::Build);
        assert_eq!(log.last_state, "build/ok");

        let reread: RunLog = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(reread.events.len(), 2);
    }
}
