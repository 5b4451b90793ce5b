//! §3 *Checkpoint*: the per-feature durable record.

use chrono::{DateTime, Utc};
use sdp_phase_api::{GuardInput, Phase};
use sdp_utils::identifiers::{FeatureId, WorkstreamId};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkstreamState {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkstreamStatus {
    pub id: WorkstreamId,
    pub status: WorkstreamState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default)]
    pub attempts: u32,
}

impl WorkstreamStatus {
    #[must_use]
    pub fn pending(id: WorkstreamId) -> Self {
        Self {
            id,
            status: WorkstreamState::Pending,
            verdict_ref: None,
            commit: None,
            attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    Approved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewStatus {
    pub iteration: u32,
    pub status: ReviewState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict_ref: Option<String>,
}

impl ReviewStatus {
    #[must_use]
    pub fn initial() -> Self {
        Self {
            iteration: 0,
            status: ReviewState::Pending,
            verdict_ref: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub schema_version: u32,
    pub feature_id: FeatureId,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub workstreams: Vec<WorkstreamStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewStatus>,
}

impl Checkpoint {
    /// A freshly initialized checkpoint: phase `init`, no workstreams assigned yet.
    #[must_use]
    pub fn init(feature_id: FeatureId, branch: String, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            feature_id,
            branch,
            pr_number: None,
            pr_url: None,
            phase: Phase::Init,
            created_at: now,
            updated_at: now,
            workstreams: Vec::new(),
            review: None,
        }
    }

    #[must_use]
    pub fn all_workstreams_done(&self) -> bool {
        !self.workstreams.is_empty() && self.workstreams.iter().all(|w| w.status == WorkstreamState::Done)
    }

    #[must_use]
    pub fn review_approved(&self) -> bool {
        matches!(
            self.review,
            Some(ReviewStatus {
                status: ReviewState::Approved,
                ..
            })
        )
    }

    /// Assemble the guard facts the FSM needs to evaluate a transition out of
    /// this checkpoint's current phase.
    #[must_use]
    pub fn guard_input(&self) -> GuardInput {
        GuardInput {
            all_workstreams_done: self.all_workstreams_done(),
            review_approved: self.review_approved(),
        }
    }

    /// First workstream, in stored order, whose status is not `done`.
    #[must_use]
    pub fn first_pending_workstream(&self) -> Option<&WorkstreamId> {
        self.workstreams
            .iter()
            .find(|w| w.status != WorkstreamState::Done)
            .map(|w| &w.id)
    }

    pub fn workstream_mut(&mut self, id: &WorkstreamId) -> Option<&mut WorkstreamStatus> {
        self.workstreams.iter_mut().find(|w| &w.id == id)
    }
}
