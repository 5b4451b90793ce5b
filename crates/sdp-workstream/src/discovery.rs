//! §4.1 Workstream Discovery and Topological Ordering.
//!
//! Workstream spec files live at `<project_root>/.sdp/workstreams/*.md`.
//! Discovery reads every file belonging to the requested feature, then
//! orders them so each workstream appears after all of its declared
//! dependencies that also belong to the feature (out-of-feature
//! dependencies are assumed already complete and ignored for ordering).

use crate::spec::{parse_spec, WorkstreamSpec};
use camino::Utf8Path;
use sdp_utils::identifiers::{FeatureId, WorkstreamId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid feature identifier: {0}")]
    InvalidFeatureId(#[from] sdp_utils::identifiers::IdentifierError),
    #[error("no workstreams found for feature {0}")]
    NoWorkstreamsFound(String),
    #[error("failed to read workstream directory {0}: {1}")]
    ReadDir(String, std::io::Error),
    #[error("failed to parse workstream spec {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: crate::spec::SpecParseError,
    },
    #[error("cycle detected among workstreams: {0}")]
    Cycle(String),
}

/// Discover and topologically order every workstream belonging to `feature`.
pub fn discover(project_root: &Utf8Path, feature: &str) -> Result<Vec<WorkstreamSpec>, DiscoveryError> {
    let feature_id = FeatureId::parse(feature)?;
    let dir = project_root.join(".sdp").join("workstreams");
    let mut specs = Vec::new();

    if dir.is_dir() {
        let entries = std::fs::read_dir(dir.as_std_path())
            .map_err(|e| DiscoveryError::ReadDir(dir.to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| DiscoveryError::ReadDir(dir.to_string(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| DiscoveryError::ReadDir(dir.to_string(), e))?;
            let spec = parse_spec(&text).map_err(|source| DiscoveryError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            if spec.ws_id.belongs_to(&feature_id) {
                specs.push(spec);
            }
        }
    }

    if specs.is_empty() {
        return Err(DiscoveryError::NoWorkstreamsFound(feature_id.to_string()));
    }

    // Deterministic tie-break for independent nodes.
    specs.sort_by(|a, b| a.ws_id.cmp(&b.ws_id));

    let ordered_ids = topological_order(&specs)?;
    let by_id: HashMap<&WorkstreamId, &WorkstreamSpec> = specs.iter().map(|s| (&s.ws_id, s)).collect();
    Ok(ordered_ids.into_iter().map(|id| (*by_id.get(&id).unwrap()).clone()).collect())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first traversal with a three-valued visitation marker. Dependencies
/// outside the supplied set are ignored (assumed already complete elsewhere).
fn topological_order(specs: &[WorkstreamSpec]) -> Result<Vec<WorkstreamId>, DiscoveryError> {
    let in_set: HashSet<&WorkstreamId> = specs.iter().map(|s| &s.ws_id).collect();
    let deps: HashMap<&WorkstreamId, Vec<&WorkstreamId>> = specs
        .iter()
        .map(|s| {
            (
                &s.ws_id,
                s.depends_on.iter().filter(|d| in_set.contains(d)).collect(),
            )
        })
        .collect();

    let mut marks: HashMap<&WorkstreamId, Mark> = specs.iter().map(|s| (&s.ws_id, Mark::Unvisited)).collect();
    let mut order = Vec::with_capacity(specs.len());

    fn visit<'a>(
        node: &'a WorkstreamId,
        deps: &HashMap<&'a WorkstreamId, Vec<&'a WorkstreamId>>,
        marks: &mut HashMap<&'a WorkstreamId, Mark>,
        order: &mut Vec<WorkstreamId>,
    ) -> Result<(), DiscoveryError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(DiscoveryError::Cycle(node.to_string())),
            _ => {}
        }
        marks.insert(node, Mark::InProgress);
        for dep in deps.get(node).into_iter().flatten() {
            visit(dep, deps, marks, order)?;
        }
        marks.insert(node, Mark::Done);
        order.push(node.clone());
        Ok(())
    }

    for spec in specs {
        visit(&spec.ws_id, &deps, &mut marks, &mut order)?;
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    fn spec_text(ws: &str, deps: &str) -> String {
        format!("---\nws_id: {ws}\nfeature_id: F016\ndepends_on: {deps}\n---\nbody\n")
    }

    #[test]
    fn orders_independent_workstreams_after_their_shared_dependency() {
        let project = TestProject::new();
        project.write(".sdp/workstreams/a.md", &spec_text("00-016-01", "[]"));
        project.write(".sdp/workstreams/b.md", &spec_text("00-016-02", "[00-016-01]"));
        project.write(".sdp/workstreams/c.md", &spec_text("00-016-03", "[00-016-01]"));
        project.write(".sdp/workstreams/d.md", &spec_text("00-016-04", "[00-016-01]"));

        let order = discover(&project.root, "F016").unwrap();
        let ids: Vec<&str> = order.iter().map(|s| s.ws_id.as_str()).collect();
        assert_eq!(ids, vec!["00-016-01", "00-016-02", "00-016-03", "00-016-04"]);
    }

    #[test]
    fn detects_cycles() {
        let project = TestProject::new();
        project.write(".sdp/workstreams/a.md", &spec_text("00-016-01", "[00-016-02]"));
        project.write(".sdp/workstreams/b.md", &spec_text("00-016-02", "[00-016-01]"));

        let err = discover(&project.root, "F016").unwrap_err();
        assert!(matches!(err, DiscoveryError::Cycle(_)));
        assert!(err.to_string().to_lowercase().contains("cycle"));
    }

    #[test]
    fn errors_when_no_workstreams_found() {
        let project = TestProject::new();
        let err = discover(&project.root, "F999").unwrap_err();
        assert!(matches!(err, DiscoveryError::NoWorkstreamsFound(_)));
    }

    #[test]
    fn ignores_out_of_feature_dependencies() {
        let project = TestProject::new();
        project.write(".sdp/workstreams/a.md", &spec_text("00-016-01", "[00-015-09]"));
        let order = discover(&project.root, "F016").unwrap();
        assert_eq!(order.len(), 1);
    }
}
