//! §4.12 Evidence emission: the four canonical per-workstream events,
//! handed to an injected writer the surrounding system persists (the
//! executor itself never owns the evidence log's storage).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Plan,
    Generation,
    Verification,
    Approval,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvidenceEvent {
    pub ws_id: String,
    pub kind: EvidenceKind,
    pub timestamp: DateTime<Utc>,
    pub payload: BTreeMap<String, String>,
}

impl EvidenceEvent {
    #[must_use]
    pub fn new(ws_id: impl Into<String>, kind: EvidenceKind, now: DateTime<Utc>, payload: BTreeMap<String, String>) -> Self {
        Self {
            ws_id: ws_id.into(),
            kind,
            timestamp: now,
            payload,
        }
    }
}

#[async_trait]
pub trait EvidenceWriter: Send + Sync {
    async fn write_event(&self, event: &EvidenceEvent) -> Result<(), String>;
}

/// In-memory writer used by tests and dry-run callers.
#[derive(Default)]
pub struct RecordingWriter {
    events: tokio::sync::Mutex<Vec<EvidenceEvent>>,
}

#[async_trait]
impl EvidenceWriter for RecordingWriter {
    async fn write_event(&self, event: &EvidenceEvent) -> Result<(), String> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

impl RecordingWriter {
    pub async fn events(&self) -> Vec<EvidenceEvent> {
        self.events.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_writer_retains_events_in_order() {
        let writer = RecordingWriter::default();
        let now = Utc::now();
        writer
            .write_event(&EvidenceEvent::new("00-016-01", EvidenceKind::Plan, now, BTreeMap::new()))
            .await
            .unwrap();
        writer
            .write_event(&EvidenceEvent::new("00-016-01", EvidenceKind::Approval, now, BTreeMap::new()))
            .await
            .unwrap();
        let events = writer.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EvidenceKind::Plan);
        assert_eq!(events[1].kind, EvidenceKind::Approval);
    }
}
