//! Assembles an [`AttestationStatement`] from a completed checkpoint and
//! the set of files changed since the branch base.

use crate::model::{
    AttestationStatement, Boundary, Execution, Intent, Plan, Provenance, Review, SelfReview, Trace, Verification,
};
use chrono::{DateTime, Utc};
use sdp_checkpoint::{Checkpoint, WorkstreamState};
use std::collections::BTreeMap;

const RUNTIME_TAG: &str = "local";

/// Maps a workstream id to the external tracker identifier it was filed
/// under, as read from the tracker mapping file.
pub type TrackerMapping = BTreeMap<String, String>;

pub struct AttestationInput<'a> {
    pub checkpoint: &'a Checkpoint,
    pub changed_files: &'a [String],
    pub allowed_prefixes: &'a [String],
    pub rationale: &'a str,
    pub tracker_mapping: &'a TrackerMapping,
    pub orchestrator: &'a str,
    pub run_id: &'a str,
    pub verification_status: &'a str,
    pub now: DateTime<Utc>,
}

/// Build the attestation statement for `input.checkpoint`'s current phase.
#[must_use]
pub fn build(input: &AttestationInput<'_>) -> AttestationStatement {
    let checkpoint = input.checkpoint;
    let feature_id = checkpoint.feature_id.to_string();

    let workstream_ids: Vec<String> = checkpoint.workstreams.iter().map(|w| w.id.to_string()).collect();

    let external_ids: Vec<String> = workstream_ids
        .iter()
        .filter_map(|id| input.tracker_mapping.get(id).cloned())
        .collect();

    let source_issue = external_ids.first().cloned().unwrap_or_else(|| feature_id.clone());

    let out_of_boundary: Vec<String> = input
        .changed_files
        .iter()
        .filter(|path| !is_allowed(path, input.allowed_prefixes))
        .cloned()
        .collect();
    let compliant = out_of_boundary.is_empty();
    let reason = if compliant {
        "all touched paths fall within declared scope prefixes".to_string()
    } else {
        format!("{} path(s) fell outside declared scope prefixes", out_of_boundary.len())
    };

    let head_commit = checkpoint
        .workstreams
        .iter()
        .rev()
        .find(|w| w.status == WorkstreamState::Done)
        .and_then(|w| w.commit.clone());

    let review = checkpoint.review.as_ref().filter(|r| matches!(r.status, sdp_checkpoint::ReviewState::Approved)).map(|_| Review {
        self_review: SelfReview {
            approved: true,
            notes: None,
        },
    });

    AttestationStatement {
        intent: Intent {
            source_issue: source_issue.clone(),
            trigger: format!("automated by {}", input.orchestrator),
        },
        plan: Plan {
            workstreams: workstream_ids,
            rationale: input.rationale.to_string(),
        },
        execution: Execution {
            external_ids: external_ids.clone(),
            branch: checkpoint.branch.clone(),
            changed_files: input.changed_files.to_vec(),
        },
        boundary: Boundary {
            allowed_prefixes: input.allowed_prefixes.to_vec(),
            touched_paths: input.changed_files.to_vec(),
            out_of_boundary,
            compliant,
            reason,
        },
        verification: Verification {
            phase: checkpoint.phase.to_string(),
            status: input.verification_status.to_string(),
            gates: Vec::new(),
        },
        provenance: Provenance {
            run_id: input.run_id.to_string(),
            orchestrator: input.orchestrator.to_string(),
            runtime: RUNTIME_TAG.to_string(),
            phase: checkpoint.phase,
            source_issue,
            captured_at: input.now,
        },
        trace: Trace {
            external_ids,
            branch: checkpoint.branch.clone(),
            head_commit,
            pr_url: checkpoint.pr_url.clone(),
        },
        review,
    }
}

fn is_allowed(path: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        path == prefix || path.starts_with(&format!("{prefix}/"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_checkpoint::{Checkpoint, ReviewState, ReviewStatus, WorkstreamStatus};
    use sdp_phase_api::Phase;
    use sdp_utils::identifiers::{FeatureId, WorkstreamId};

    fn checkpoint() -> Checkpoint {
        let mut cp = Checkpoint::init(FeatureId::parse("F016").unwrap(), "feature/f016".to_string(), Utc::now());
        cp.phase = Phase::Done;
        let mut ws = WorkstreamStatus::pending(WorkstreamId::parse("00-016-01").unwrap());
        ws.status = WorkstreamState::Done;
        ws.commit = Some("deadbeef".to_string());
        cp.workstreams.push(ws);
        cp.review = Some(ReviewStatus {
            iteration: 1,
            status: ReviewState::Approved,
            verdict_ref: None,
        });
        cp
    }

    #[test]
    fn compliant_when_all_changed_files_are_in_scope() {
        let cp = checkpoint();
        let input = AttestationInput {
            checkpoint: &cp,
            changed_files: &["src/guard.rs".to_string()],
            allowed_prefixes: &["src".to_string()],
            rationale: "implement scope guard",
            tracker_mapping: &BTreeMap::new(),
            orchestrator: "xchecker",
            run_id: "run-1",
            verification_status: "passed",
            now: Utc::now(),
        };
        let statement = build(&input);
        assert!(statement.boundary.compliant);
        assert_eq!(statement.intent.source_issue, "F016");
        assert_eq!(statement.trace.head_commit.as_deref(), Some("deadbeef"));
        assert!(statement.review.unwrap().self_review.approved);
    }

    #[test]
    fn out_of_boundary_changes_are_flagged() {
        let cp = checkpoint();
        let input = AttestationInput {
            checkpoint: &cp,
            changed_files: &["src/guard.rs".to_string(), "other/file.rs".to_string()],
            allowed_prefixes: &["src".to_string()],
            rationale: "implement scope guard",
            tracker_mapping: &BTreeMap::new(),
            orchestrator: "xchecker",
            run_id: "run-1",
            verification_status: "passed",
            now: Utc::now(),
        };
        let statement = build(&input);
        assert!(!statement.boundary.compliant);
        assert_eq!(statement.boundary.out_of_boundary, vec!["other/file.rs".to_string()]);
    }

    #[test]
    fn tracker_mapping_supplies_source_issue_and_external_ids() {
        let cp = checkpoint();
        let mut mapping = BTreeMap::new();
        mapping.insert("00-016-01".to_string(), "bd-42".to_string());
        let input = AttestationInput {
            checkpoint: &cp,
            changed_files: &[],
            allowed_prefixes: &[],
            rationale: "x",
            tracker_mapping: &mapping,
            orchestrator: "xchecker",
            run_id: "run-1",
            verification_status: "passed",
            now: Utc::now(),
        };
        let statement = build(&input);
        assert_eq!(statement.intent.source_issue, "bd-42");
        assert_eq!(statement.execution.external_ids, vec!["bd-42".to_string()]);
    }
}
