//! §4.12 ParseDependencies error policy: a workstream whose dependency
//! declaration fails to parse is never silently skipped — it is executed
//! with an empty dependency set and a warning is surfaced to the caller.

use sdp_utils::identifiers::WorkstreamId;
use std::collections::BTreeMap;

/// A workstream as handed to the standalone executor: its dependency
/// declaration may have failed to parse upstream (malformed front-matter,
/// an unreadable spec file, …), in which case `depends_on` carries the
/// parse failure reason instead of a resolved list.
pub struct WorkstreamTask {
    pub id: WorkstreamId,
    pub depends_on: Result<Vec<WorkstreamId>, String>,
}

impl WorkstreamTask {
    #[must_use]
    pub fn ok(id: WorkstreamId, depends_on: Vec<WorkstreamId>) -> Self {
        Self {
            id,
            depends_on: Ok(depends_on),
        }
    }

    #[must_use]
    pub fn parse_failed(id: WorkstreamId, reason: impl Into<String>) -> Self {
        Self {
            id,
            depends_on: Err(reason.into()),
        }
    }
}

/// A dependency that failed to parse for `id`; treated as an empty set but
/// reported so the caller can surface it (log, CLI warning, …).
#[derive(Debug, Clone)]
pub struct DependencyParseWarning {
    pub id: WorkstreamId,
    pub reason: String,
}

/// Builds the adjacency map the topological sort consumes, applying the
/// safe-fallback policy: a task whose dependency parse failed contributes
/// an empty edge list and a warning, never an error and never a skip.
pub fn parse_dependencies(
    tasks: &[WorkstreamTask],
) -> (BTreeMap<WorkstreamId, Vec<WorkstreamId>>, Vec<DependencyParseWarning>) {
    let mut edges = BTreeMap::new();
    let mut warnings = Vec::new();
    for task in tasks {
        match &task.depends_on {
            Ok(deps) => {
                edges.insert(task.id.clone(), deps.clone());
            }
            Err(reason) => {
                tracing::warn!(workstream = %task.id, reason, "dependency parse failed, treating as no dependencies");
                warnings.push(DependencyParseWarning {
                    id: task.id.clone(),
                    reason: reason.clone(),
                });
                edges.insert(task.id.clone(), Vec::new());
            }
        }
    }
    (edges, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> WorkstreamId {
        WorkstreamId::parse(s).unwrap()
    }

    #[test]
    fn failed_parse_contributes_empty_edges_and_a_warning() {
        let tasks = vec![
            WorkstreamTask::ok(id("00-016-01"), vec![]),
            WorkstreamTask::parse_failed(id("00-016-02"), "malformed depends_on"),
        ];
        let (edges, warnings) = parse_dependencies(&tasks);
        assert_eq!(edges.get(&id("00-016-02")).unwrap(), &Vec::<WorkstreamId>::new());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].id, id("00-016-02"));
    }

    #[test]
    fn well_formed_dependencies_pass_through_unchanged() {
        let tasks = vec![WorkstreamTask::ok(id("00-016-02"), vec![id("00-016-01")])];
        let (edges, warnings) = parse_dependencies(&tasks);
        assert_eq!(edges.get(&id("00-016-02")).unwrap(), &vec![id("00-016-01")]);
        assert!(warnings.is_empty());
    }
}
