//! §4.2 Context Hydrator.

use camino::{Utf8Path, Utf8PathBuf};
use sdp_checkpoint::Checkpoint;
use sdp_utils::identifiers::WorkstreamId;
use sdp_workstream::WorkstreamSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONTEXT_PACKET_FILE: &str = "context-packet.json";

#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("no workstream supplied for hydration")]
    NoWorkstream,
    #[error("quality gates block is empty or absent from the agents document")]
    EmptyQualityGates,
    #[error("failed to write context packet {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to serialize context packet: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Resolves a dependency workstream id to the external tracker's rendered
/// text. Implementations typically read a local id-mapping file and shell
/// out to the tracker's command-line tool; tests supply a stub.
pub trait DependencyResolver {
    fn resolve(&self, dep: &WorkstreamId) -> Option<String>;
}

/// A resolver that never finds anything, for workstreams with no external
/// dependencies or when tracker integration isn't configured.
pub struct NullResolver;

impl DependencyResolver for NullResolver {
    fn resolve(&self, _dep: &WorkstreamId) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPacket {
    pub workstream: String,
    pub acceptance_criteria: Vec<String>,
    pub scope_files: Vec<String>,
    pub checkpoint: Checkpoint,
    pub dependencies: BTreeMap<String, String>,
    pub quality_gates: String,
    pub drift_status: String,
}

/// Extract the `## Quality Gates` section of the agents document, verbatim,
/// up to (not including) the next top-level heading.
#[must_use]
pub fn extract_quality_gates(agents_doc: &str) -> Option<String> {
    let mut lines = agents_doc.lines();
    let mut body = String::new();
    let mut in_section = false;
    for line in &mut lines {
        if line.trim_start().starts_with("## ") {
            if in_section {
                break;
            }
            in_section = line.trim_start().trim_start_matches('#').trim() == "Quality Gates";
            continue;
        }
        if in_section {
            body.push_str(line);
            body.push('\n');
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Hydrate a context packet for one or more workstreams. For workstream-scoped
/// phases, pass a single spec; for feature-scoped phases (review), pass the
/// full ordered list — additional specs are appended to `workstream`
/// separated by a document divider.
pub fn hydrate(
    workstreams: &[WorkstreamSpec],
    checkpoint: &Checkpoint,
    agents_doc: &str,
    drift_status: &str,
    resolver: &dyn DependencyResolver,
) -> Result<ContextPacket, HydrationError> {
    let Some(first) = workstreams.first() else {
        return Err(HydrationError::NoWorkstream);
    };

    let mut workstream_text = first.raw.clone();
    let mut acceptance_criteria = first.acceptance_criteria.clone();
    let mut scope_files = first.scope_files.clone();
    let mut dependencies = BTreeMap::new();
    for dep in &first.depends_on {
        if let Some(text) = resolver.resolve(dep) {
            dependencies.insert(dep.as_str().to_string(), text);
        }
    }

    for extra in &workstreams[1..] {
        workstream_text.push_str("\n---\n");
        workstream_text.push_str(&extra.raw);
        acceptance_criteria.extend(extra.acceptance_criteria.iter().cloned());
        scope_files.extend(extra.scope_files.iter().cloned());
        for dep in &extra.depends_on {
            if let Some(text) = resolver.resolve(dep) {
                dependencies.insert(dep.as_str().to_string(), text);
            }
        }
    }

    let quality_gates = extract_quality_gates(agents_doc).ok_or(HydrationError::EmptyQualityGates)?;

    if workstream_text.trim().is_empty() {
        return Err(HydrationError::NoWorkstream);
    }

    Ok(ContextPacket {
        workstream: workstream_text,
        acceptance_criteria,
        scope_files,
        checkpoint: checkpoint.clone(),
        dependencies,
        quality_gates,
        drift_status: drift_status.to_string(),
    })
}

#[must_use]
pub fn context_packet_path(project_root: &Utf8Path) -> Utf8PathBuf {
    project_root.join(".sdp").join(CONTEXT_PACKET_FILE)
}

/// Serialize and write the context packet atomically (temp + rename).
pub fn write_context_packet(project_root: &Utf8Path, packet: &ContextPacket) -> Result<Utf8PathBuf, HydrationError> {
    let path = context_packet_path(project_root);
    let bytes = serde_json::to_vec_pretty(packet)?;
    sdp_utils::atomic_write::write_atomic(&path, &bytes).map_err(|source| HydrationError::Write {
        path: path.to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sdp_checkpoint::Checkpoint;
    use sdp_utils::identifiers::FeatureId;
    use sdp_workstream::parse_spec;

    fn checkpoint() -> Checkpoint {
        Checkpoint::init(FeatureId::parse("F016").unwrap(), "feature/f016".to_string(), Utc::now())
    }

    const SAMPLE: &str = "---\nws_id: 00-016-01\nfeature_id: F016\ndepends_on: []\n---\n\n## Scope Files\n\n- `src/lib.rs`\n\n## Acceptance Criteria\n\n- [ ] Does the thing\n";

    const AGENTS_DOC: &str = "# Agents\n\nSome intro.\n\n## Quality Gates\n\n- cargo test\n- cargo clippy\n\n## Another Section\n\nignored\n";

    #[test]
    fn hydrates_single_workstream() {
        let spec = parse_spec(SAMPLE).unwrap();
        let packet = hydrate(&[spec], &checkpoint(), AGENTS_DOC, "clean", &NullResolver).unwrap();
        assert!(packet.workstream.contains("00-016-01"));
        assert_eq!(packet.acceptance_criteria.len(), 1);
        assert_eq!(packet.scope_files, vec!["src/lib.rs"]);
        assert!(packet.quality_gates.contains("cargo test"));
        assert!(!packet.quality_gates.contains("Another Section"));
    }

    #[test]
    fn fails_when_no_workstream_supplied() {
        let err = hydrate(&[], &checkpoint(), AGENTS_DOC, "clean", &NullResolver).unwrap_err();
        assert!(matches!(err, HydrationError::NoWorkstream));
    }

    #[test]
    fn fails_when_quality_gates_missing() {
        let spec = parse_spec(SAMPLE).unwrap();
        let err = hydrate(&[spec], &checkpoint(), "# Agents\n\nno gates here\n", "clean", &NullResolver).unwrap_err();
        assert!(matches!(err, HydrationError::EmptyQualityGates));
    }

    #[test]
    fn appends_additional_workstreams_with_divider() {
        let a = parse_spec(SAMPLE).unwrap();
        let b_text = SAMPLE.replace("00-016-01", "00-016-02");
        let b = parse_spec(&b_text).unwrap();
        let packet = hydrate(&[a, b], &checkpoint(), AGENTS_DOC, "clean", &NullResolver).unwrap();
        assert!(packet.workstream.contains("---"));
        assert!(packet.workstream.contains("00-016-01"));
        assert!(packet.workstream.contains("00-016-02"));
        assert_eq!(packet.acceptance_criteria.len(), 2);
    }
}
