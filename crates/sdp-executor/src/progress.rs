//! §4.12 Progress reporting: a human-readable 12-segment block bar and a
//! JSON-line event stream, plus the end-of-run summary record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

const BAR_SEGMENTS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkstreamStatus {
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub ws_id: String,
    pub status: WorkstreamStatus,
    /// 0-100.
    pub progress: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    #[must_use]
    pub fn new(ws_id: impl Into<String>, status: WorkstreamStatus, progress: u8, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            ws_id: ws_id.into(),
            status,
            progress: progress.min(100),
            message: message.into(),
            timestamp: now,
        }
    }
}

/// Renders `[wsID] ████░░░░ 50% — message`, twelve block segments wide.
#[must_use]
pub fn render_human(event: &ProgressEvent) -> String {
    let filled = (usize::from(event.progress) * BAR_SEGMENTS) / 100;
    let filled = filled.min(BAR_SEGMENTS);
    let bar: String = "█".repeat(filled) + &"░".repeat(BAR_SEGMENTS - filled);
    format!("[{}] {} {}% — {}", event.ws_id, bar, event.progress, event.message)
}

/// Renders the event as a single JSON line.
pub fn render_json(event: &ProgressEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Human,
    Json,
}

pub trait ProgressSink {
    fn emit(&mut self, event: &ProgressEvent);
}

pub struct WriterSink<W: std::io::Write> {
    pub mode: ProgressMode,
    pub writer: W,
}

impl<W: std::io::Write> ProgressSink for WriterSink<W> {
    fn emit(&mut self, event: &ProgressEvent) {
        let line = match self.mode {
            ProgressMode::Human => render_human(event),
            ProgressMode::Json => render_json(event).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        };
        let _ = writeln!(self.writer, "{line}");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_retries: u32,
    pub wall_clock: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-07-27T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn renders_half_filled_bar_at_fifty_percent() {
        let event = ProgressEvent::new("00-016-01", WorkstreamStatus::Running, 50, "building", now());
        let line = render_human(&event);
        assert_eq!(line, "[00-016-01] ██████░░░░░░ 50% — building");
    }

    #[test]
    fn renders_full_bar_at_one_hundred_percent() {
        let event = ProgressEvent::new("00-016-01", WorkstreamStatus::Succeeded, 100, "done", now());
        let line = render_human(&event);
        assert_eq!(line, "[00-016-01] ████████████ 100% — done");
    }

    #[test]
    fn json_line_round_trips_the_ws_id_and_status() {
        let event = ProgressEvent::new("00-016-01", WorkstreamStatus::Failed, 40, "retrying", now());
        let line = render_json(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["ws_id"], "00-016-01");
        assert_eq!(value["status"], "failed");
    }
}
