//! §4.8 Finite-State Machine: the declared set of valid phase transitions,
//! their guard conditions, and `ComputeNextAction`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Build,
    Review,
    Pr,
    Ci,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Build => "build",
            Self::Review => "review",
            Self::Pr => "pr",
            Self::Ci => "ci",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

impl Phase {
    /// Every state this phase may legally transition to.
    #[must_use]
    pub fn legal_targets(self) -> &'static [Phase] {
        match self {
            Phase::Init => &[Phase::Build],
            Phase::Build => &[Phase::Build, Phase::Review],
            Phase::Review => &[Phase::Pr],
            Phase::Pr => &[Phase::Ci],
            Phase::Ci => &[Phase::Done],
            Phase::Done => &[Phase::Done],
        }
    }
}

/// The guard facts `advance` needs; callers assemble this from the
/// checkpoint's workstream statuses and review status.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardInput {
    /// True if every workstream in the feature has status `done`.
    pub all_workstreams_done: bool,
    /// True if `ReviewStatus.status == approved`.
    pub review_approved: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FsmError {
    #[error("illegal transition {from} -> {to}; legal targets from {from} are {legal:?}")]
    IllegalTransition {
        from: Phase,
        to: Phase,
        legal: Vec<Phase>,
    },
    #[error("transition {from} -> {to} rejected: {reason}")]
    GuardFailed { from: Phase, to: Phase, reason: &'static str },
}

/// Attempt to move from `from` to `to`. `Done -> Done` is always accepted
/// (idempotent). Every other pair not in the declared table is rejected with
/// the legal targets from `from`. A legal pair whose guard fails is rejected
/// with a guard-specific reason.
pub fn advance(from: Phase, to: Phase, guard: GuardInput) -> Result<Phase, FsmError> {
    if from == Phase::Done && to == Phase::Done {
        return Ok(Phase::Done);
    }
    if !from.legal_targets().contains(&to) {
        return Err(FsmError::IllegalTransition {
            from,
            to,
            legal: from.legal_targets().to_vec(),
        });
    }
    match (from, to) {
        (Phase::Build, Phase::Review) if !guard.all_workstreams_done => Err(FsmError::GuardFailed {
            from,
            to,
            reason: "at least one workstream is not yet done",
        }),
        (Phase::Review, Phase::Pr) if !guard.review_approved => Err(FsmError::GuardFailed {
            from,
            to,
            reason: "review status is not approved",
        }),
        _ => Ok(to),
    }
}

/// What the supervisor should do next, given the current phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    Init,
    Build(String),
    Review,
    Pr,
    CiLoop(Option<u64>),
    Done,
}

/// §4.8 `ComputeNextAction`. In `Build`, `first_pending_workstream` should be
/// the first workstream (in topological order) whose status is not `done`;
/// `None` there means build is complete but the FSM hasn't advanced yet.
#[must_use]
pub fn compute_next_action(phase: Phase, first_pending_workstream: Option<&str>, pr_number: Option<u64>) -> NextAction {
    match phase {
        Phase::Init => NextAction::Init,
        Phase::Build => match first_pending_workstream {
            Some(ws) => NextAction::Build(ws.to_string()),
            None => NextAction::Review,
        },
        Phase::Review => NextAction::Review,
        Phase::Pr => NextAction::Pr,
        Phase::Ci => NextAction::CiLoop(pr_number),
        Phase::Done => NextAction::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_the_declared_transitions() {
        let g = GuardInput {
            all_workstreams_done: true,
            review_approved: true,
        };
        assert!(advance(Phase::Init, Phase::Build, g).is_ok());
        assert!(advance(Phase::Build, Phase::Build, g).is_ok());
        assert!(advance(Phase::Build, Phase::Review, g).is_ok());
        assert!(advance(Phase::Review, Phase::Pr, g).is_ok());
        assert!(advance(Phase::Pr, Phase::Ci, g).is_ok());
        assert!(advance(Phase::Ci, Phase::Done, g).is_ok());
        assert!(advance(Phase::Done, Phase::Done, g).is_ok());
    }

    #[test]
    fn rejects_undeclared_transition_with_legal_targets() {
        let g = GuardInput::default();
        let err = advance(Phase::Init, Phase::Review, g).unwrap_err();
        match err {
            FsmError::IllegalTransition { legal, .. } => assert_eq!(legal, vec![Phase::Build]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn build_to_review_rejected_when_workstream_pending() {
        let g = GuardInput {
            all_workstreams_done: false,
            review_approved: true,
        };
        let err = advance(Phase::Build, Phase::Review, g).unwrap_err();
        assert!(matches!(err, FsmError::GuardFailed { .. }));
    }

    #[test]
    fn build_to_review_succeeds_once_all_done() {
        let g = GuardInput {
            all_workstreams_done: true,
            review_approved: false,
        };
        assert!(advance(Phase::Build, Phase::Review, g).is_ok());
    }

    #[test]
    fn review_to_pr_requires_approval() {
        let g = GuardInput {
            all_workstreams_done: true,
            review_approved: false,
        };
        assert!(advance(Phase::Review, Phase::Pr, g).is_err());
        let g2 = GuardInput {
            all_workstreams_done: true,
            review_approved: true,
        };
        assert!(advance(Phase::Review, Phase::Pr, g2).is_ok());
    }

    #[test]
    fn compute_next_action_selects_first_pending_workstream() {
        let action = compute_next_action(Phase::Build, Some("00-004-02"), None);
        assert_eq!(action, NextAction::Build("00-004-02".to_string()));
    }

    #[test]
    fn done_is_idempotent() {
        let g = GuardInput::default();
        assert!(advance(Phase::Done, Phase::Done, g).is_ok());
        assert_eq!(compute_next_action(Phase::Done, None, None), NextAction::Done);
    }
}
