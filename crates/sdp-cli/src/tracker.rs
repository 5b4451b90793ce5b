//! §6 Tracker mapping file: `.beads-sdp-mapping.jsonl`, one `{sdp_id,
//! beads_id}` object per line, read into the `TrackerMapping` the
//! attestation builder and the `DependencyResolver` both consult.

use camino::Utf8Path;
use sdp_attestation::TrackerMapping;
use sdp_packet::DependencyResolver;
use sdp_utils::identifiers::WorkstreamId;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TrackerMappingError {
    #[error("failed to read tracker mapping {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse tracker mapping {path} at line {line}: {source}")]
    Parse {
        path: String,
        line: usize,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct MappingLine {
    sdp_id: String,
    beads_id: String,
}

/// Parse the tracker mapping file. An absent file is not an error: it means
/// no external tracker is configured and every lookup resolves to `None`.
pub fn load(path: &Utf8Path) -> Result<TrackerMapping, TrackerMappingError> {
    if !path.is_file() {
        return Ok(TrackerMapping::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| TrackerMappingError::Read {
        path: path.to_string(),
        source,
    })?;

    let mut mapping = TrackerMapping::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let entry: MappingLine = serde_json::from_str(line).map_err(|source| TrackerMappingError::Parse {
            path: path.to_string(),
            line: idx + 1,
            source,
        })?;
        mapping.insert(entry.sdp_id, entry.beads_id);
    }
    Ok(mapping)
}

/// Resolves a workstream's dependency to the external tracker id it was
/// filed under, falling back to no resolution when the workstream is
/// absent from the mapping.
pub struct FileBackedResolver {
    mapping: TrackerMapping,
}

impl FileBackedResolver {
    #[must_use]
    pub fn new(mapping: TrackerMapping) -> Self {
        Self { mapping }
    }
}

impl DependencyResolver for FileBackedResolver {
    fn resolve(&self, dep: &WorkstreamId) -> Option<String> {
        self.mapping.get(dep.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn missing_file_yields_empty_mapping() {
        let project = TestProject::new();
        let mapping = load(&project.root.join(".beads-sdp-mapping.jsonl")).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn parses_one_entry_per_line() {
        let project = TestProject::new();
        project.write(
            ".beads-sdp-mapping.jsonl",
            "{\"sdp_id\": \"00-016-01\", \"beads_id\": \"bd-42\"}\n",
        );
        let mapping = load(&project.root.join(".beads-sdp-mapping.jsonl")).unwrap();
        assert_eq!(mapping.get("00-016-01"), Some(&"bd-42".to_string()));
    }

    #[test]
    fn resolver_falls_back_to_none_for_unmapped_workstream() {
        let mut mapping = TrackerMapping::new();
        mapping.insert("00-016-01".to_string(), "bd-42".to_string());
        let resolver = FileBackedResolver::new(mapping);
        assert_eq!(resolver.resolve(&WorkstreamId::parse("00-016-02").unwrap()), None);
        assert_eq!(resolver.resolve(&WorkstreamId::parse("00-016-01").unwrap()), Some("bd-42".to_string()));
    }
}
