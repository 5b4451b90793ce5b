//! §4.11 Constraint Engine: a static, per-phase policy document plus
//! containment thresholds that escalate severity as violations accumulate.

mod document;

pub use document::{load, ConstraintsDocument, ConstraintsLoadError};

use globset::Glob;
use sdp_phase_api::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    CommandPattern,
    FilePattern,
    FileExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warn,
    Block,
    Halt,
    Escalate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub phase: Phase,
    pub kind: CheckKind,
    #[serde(default)]
    pub pattern: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("constraint {id} declares an invalid regex pattern {pattern:?}: {source}")]
    InvalidRegex {
        id: String,
        pattern: String,
        source: regex::Error,
    },
    #[error("constraint {id} declares an invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        id: String,
        pattern: String,
        source: globset::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint_id: String,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
}

/// What triggered an evaluation pass: a proposed subprocess command line, a
/// file being accessed, or the set of files known to be present (checked
/// against `file_exists` constraints).
pub enum Check<'a> {
    Command(&'a str),
    FileAccess(&'a str),
    RequiredFiles(&'a [&'a str]),
}

pub struct ConstraintEngine {
    constraints: Vec<Constraint>,
    thresholds: BTreeMap<u32, Severity>,
    counts: BTreeMap<String, u32>,
}

impl ConstraintEngine {
    pub fn new(constraints: Vec<Constraint>, thresholds: BTreeMap<u32, Severity>) -> Result<Self, ConstraintError> {
        for c in &constraints {
            if let Some(pattern) = &c.pattern {
                match c.kind {
                    CheckKind::CommandPattern => {
                        regex::Regex::new(pattern).map_err(|source| ConstraintError::InvalidRegex {
                            id: c.id.clone(),
                            pattern: pattern.clone(),
                            source,
                        })?;
                    }
                    CheckKind::FilePattern => {
                        Glob::new(pattern).map_err(|source| ConstraintError::InvalidGlob {
                            id: c.id.clone(),
                            pattern: pattern.clone(),
                            source,
                        })?;
                    }
                    CheckKind::FileExists => {}
                }
            }
        }
        Ok(Self {
            constraints,
            thresholds,
            counts: BTreeMap::new(),
        })
    }

    /// Evaluate every constraint applicable to `phase` against `check`,
    /// returning the triggered violations with their containment-escalated
    /// severity.
    pub fn evaluate(&mut self, phase: Phase, check: &Check<'_>) -> Vec<Violation> {
        let applicable: Vec<Constraint> = self.constraints.iter().filter(|c| c.phase == phase).cloned().collect();
        let mut violations = Vec::new();
        for constraint in applicable {
            if !Self::triggers(&constraint, check) {
                continue;
            }
            let count = self.counts.entry(constraint.id.clone()).or_insert(0);
            *count += 1;
            let severity = Self::effective_severity(constraint.severity, *count, &self.thresholds);
            violations.push(Violation {
                constraint_id: constraint.id.clone(),
                phase,
                severity,
                message: format!("constraint {} triggered ({:?})", constraint.id, constraint.kind),
            });
        }
        violations
    }

    fn triggers(constraint: &Constraint, check: &Check<'_>) -> bool {
        match (constraint.kind, check) {
            (CheckKind::CommandPattern, Check::Command(cmd)) => constraint
                .pattern
                .as_deref()
                .and_then(|p| regex::Regex::new(p).ok())
                .is_some_and(|re| re.is_match(cmd)),
            (CheckKind::FilePattern, Check::FileAccess(path)) => constraint
                .pattern
                .as_deref()
                .and_then(|p| Glob::new(p).ok())
                .is_some_and(|glob| glob.compile_matcher().is_match(path)),
            (CheckKind::FileExists, Check::RequiredFiles(present)) => constraint
                .pattern
                .as_deref()
                .is_some_and(|required| !present.contains(&required)),
            _ => false,
        }
    }

    /// The containment-thresholds table maps a cumulative violation count to
    /// an effective severity (e.g. first warning stays `warn`; fifth escalates
    /// to `block`). The highest threshold not exceeding `count` wins; absent
    /// any matching threshold, the constraint's own declared severity applies.
    fn effective_severity(declared: Severity, count: u32, thresholds: &BTreeMap<u32, Severity>) -> Severity {
        thresholds
            .range(..=count)
            .next_back()
            .map(|(_, sev)| (*sev).max(declared))
            .unwrap_or(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(severity: Severity, thresholds: BTreeMap<u32, Severity>) -> ConstraintEngine {
        let constraints = vec![Constraint {
            id: "no-rm-rf".to_string(),
            phase: Phase::Build,
            kind: CheckKind::CommandPattern,
            pattern: Some(r"rm\s+-rf".to_string()),
            severity,
        }];
        ConstraintEngine::new(constraints, thresholds).unwrap()
    }

    #[test]
    fn command_pattern_triggers_on_match() {
        let mut engine = engine(Severity::Warn, BTreeMap::new());
        let violations = engine.evaluate(Phase::Build, &Check::Command("rm -rf /"));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint_id, "no-rm-rf");
    }

    #[test]
    fn command_pattern_does_not_trigger_without_match() {
        let mut engine = engine(Severity::Warn, BTreeMap::new());
        let violations = engine.evaluate(Phase::Build, &Check::Command("ls -la"));
        assert!(violations.is_empty());
    }

    #[test]
    fn containment_threshold_escalates_after_fifth_violation() {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(1, Severity::Warn);
        thresholds.insert(5, Severity::Block);
        let mut engine = engine(Severity::Warn, thresholds);

        let mut last = Severity::Warn;
        for _ in 0..5 {
            let violations = engine.evaluate(Phase::Build, &Check::Command("rm -rf x"));
            last = violations[0].severity;
        }
        assert_eq!(last, Severity::Block);
    }

    #[test]
    fn file_exists_constraint_triggers_when_file_absent() {
        let constraints = vec![Constraint {
            id: "needs-readme".to_string(),
            phase: Phase::Pr,
            kind: CheckKind::FileExists,
            pattern: Some("README.md".to_string()),
            severity: Severity::Halt,
        }];
        let mut engine = ConstraintEngine::new(constraints, BTreeMap::new()).unwrap();
        let violations = engine.evaluate(Phase::Pr, &Check::RequiredFiles(&["Cargo.toml"]));
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn constraints_for_other_phases_are_not_applicable() {
        let mut engine = engine(Severity::Warn, BTreeMap::new());
        let violations = engine.evaluate(Phase::Review, &Check::Command("rm -rf /"));
        assert!(violations.is_empty());
    }
}
