//! §4.3 Prompt Provenance.

use crate::hashing::sha256_hex;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub const PROVENANCE_FILE: &str = "prompt-provenance.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    WorkstreamSpec,
    Checkpoint,
    ScopeFile,
    AgentsMd,
    Skill,
    ContextPacket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub path: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptProvenance {
    pub prompt_hash: String,
    pub context_sources: Vec<ContextSource>,
}

/// A candidate source to hash: its declared kind, its project-root-relative
/// path for the record, and its absolute path to read from disk.
pub struct SourceCandidate<'a> {
    pub source_type: SourceType,
    pub relative_path: String,
    pub absolute_path: &'a Utf8Path,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("failed to write prompt provenance {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to serialize prompt provenance: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Compute `prompt_hash` over `prompt_bytes` and hash every candidate source
/// that exists on disk; candidates whose file is absent are silently omitted.
#[must_use]
pub fn build_provenance(prompt_bytes: &[u8], candidates: &[SourceCandidate<'_>]) -> PromptProvenance {
    let prompt_hash = sha256_hex(prompt_bytes);
    let context_sources = candidates
        .iter()
        .filter_map(|candidate| {
            let bytes = std::fs::read(candidate.absolute_path).ok()?;
            Some(ContextSource {
                source_type: candidate.source_type,
                path: candidate.relative_path.clone(),
                hash: sha256_hex(&bytes),
            })
        })
        .collect();
    PromptProvenance {
        prompt_hash,
        context_sources,
    }
}

#[must_use]
pub fn provenance_path(project_root: &Utf8Path) -> Utf8PathBuf {
    project_root.join(".sdp").join(PROVENANCE_FILE)
}

/// Persist the provenance record atomically (temp + rename). The record is
/// still written even if every candidate source was missing.
pub fn write_provenance(project_root: &Utf8Path, provenance: &PromptProvenance) -> Result<Utf8PathBuf, ProvenanceError> {
    let path = provenance_path(project_root);
    let bytes = serde_json::to_vec_pretty(provenance)?;
    sdp_utils::atomic_write::write_atomic(&path, &bytes).map_err(|source| ProvenanceError::Write {
        path: path.to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn hashes_existing_sources_and_omits_missing() {
        let project = TestProject::new();
        let spec_path = project.write("workstream.md", "ws content");

        let candidates = vec![
            SourceCandidate {
                source_type: SourceType::WorkstreamSpec,
                relative_path: "workstream.md".to_string(),
                absolute_path: &spec_path,
            },
            SourceCandidate {
                source_type: SourceType::Skill,
                relative_path: "skill.md".to_string(),
                absolute_path: &project.root.join("skill.md"),
            },
        ];

        let provenance = build_provenance(b"rendered prompt", &candidates);
        assert_eq!(provenance.context_sources.len(), 1);
        assert_eq!(provenance.context_sources[0].path, "workstream.md");
        assert_eq!(provenance.prompt_hash, sha256_hex(b"rendered prompt"));
    }

    #[test]
    fn record_is_written_even_with_no_sources() {
        let project = TestProject::new();
        let provenance = build_provenance(b"x", &[]);
        let path = write_provenance(&project.root, &provenance).unwrap();
        assert!(path.exists());
    }
}
