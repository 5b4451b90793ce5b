//! §4.15 Configuration Layer: the on-disk constraints document
//! (`.sdp/constraints.toml`) — the constraint list plus the containment
//! thresholds, in the shape [`ConstraintEngine::new`] expects.

use crate::{Constraint, Severity};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum ConstraintsLoadError {
    #[error("failed to read constraints document {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse constraints document {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    constraints: Vec<Constraint>,
    #[serde(default)]
    thresholds: BTreeMap<u32, Severity>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintsDocument {
    pub constraints: Vec<Constraint>,
    pub thresholds: BTreeMap<u32, Severity>,
}

/// Parse a constraints document. An absent file is not an error (no
/// constraints configured is the default); a present file that fails to
/// parse is a fail-fast configuration error (§4.15).
pub fn load(path: &Utf8Path) -> Result<ConstraintsDocument, ConstraintsLoadError> {
    if !path.is_file() {
        return Ok(ConstraintsDocument::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConstraintsLoadError::Read {
        path: path.to_string(),
        source,
    })?;
    let raw: RawDocument = toml::from_str(&text).map_err(|source| ConstraintsLoadError::Parse {
        path: path.to_string(),
        source,
    })?;
    Ok(ConstraintsDocument {
        constraints: raw.constraints,
        thresholds: raw.thresholds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_phase_api::Phase;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn missing_document_yields_no_constraints() {
        let project = TestProject::new();
        let doc = load(&project.root.join(".sdp/constraints.toml")).unwrap();
        assert!(doc.constraints.is_empty());
        assert!(doc.thresholds.is_empty());
    }

    #[test]
    fn parses_constraints_and_thresholds() {
        let project = TestProject::new();
        project.write(
            ".sdp/constraints.toml",
            concat!(
                "[[constraints]]\n",
                "id = \"no-rm-rf\"\n",
                "phase = \"build\"\n",
                "kind = \"command_pattern\"\n",
                "pattern = \"rm\\\\s+-rf\"\n",
                "severity = \"warn\"\n",
                "\n",
                "[thresholds]\n",
                "1 = \"warn\"\n",
                "5 = \"block\"\n",
            ),
        );
        let doc = load(&project.root.join(".sdp/constraints.toml")).unwrap();
        assert_eq!(doc.constraints.len(), 1);
        assert_eq!(doc.constraints[0].phase, Phase::Build);
        assert_eq!(doc.thresholds.get(&5), Some(&Severity::Block));
    }

    #[test]
    fn malformed_document_is_rejected() {
        let project = TestProject::new();
        project.write(".sdp/constraints.toml", "not valid toml [[[");
        let err = load(&project.root.join(".sdp/constraints.toml")).unwrap_err();
        assert!(matches!(err, ConstraintsLoadError::Parse { .. }));
    }
}
