//! §4.15 Configuration Layer: the on-disk hooks document (`.sdp/hooks.toml`),
//! a map from hook kind to its [`HookSpec`].

use crate::{HookKind, HookSpec};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum HooksLoadError {
    #[error("failed to read hooks document {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse hooks document {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("hooks document declares an unknown phase key {0:?}")]
    UnknownPhaseKey(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    hooks: BTreeMap<String, HookSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct HooksDocument {
    hooks: BTreeMap<HookKind, HookSpec>,
}

impl HooksDocument {
    #[must_use]
    pub fn get(&self, kind: HookKind) -> Option<&HookSpec> {
        self.hooks.get(&kind)
    }
}

/// Parse a hooks document. An absent file is not an error (no hooks
/// configured is the default); a present file with an unrecognized phase
/// key is a fail-fast configuration error (§4.15).
pub fn load(path: &Utf8Path) -> Result<HooksDocument, HooksLoadError> {
    if !path.is_file() {
        return Ok(HooksDocument::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| HooksLoadError::Read {
        path: path.to_string(),
        source,
    })?;
    let raw: RawDocument = toml::from_str(&text).map_err(|source| HooksLoadError::Parse {
        path: path.to_string(),
        source,
    })?;

    let mut hooks = BTreeMap::new();
    for (key, spec) in raw.hooks {
        let kind = kind_from_key(&key).ok_or_else(|| HooksLoadError::UnknownPhaseKey(key.clone()))?;
        hooks.insert(kind, spec);
    }
    Ok(HooksDocument { hooks })
}

fn kind_from_key(key: &str) -> Option<HookKind> {
    use HookKind::*;
    Some(match key {
        "pre_build" => PreBuild,
        "post_build" => PostBuild,
        "pre_review" => PreReview,
        "post_review" => PostReview,
        "pre_pr" => PrePr,
        "post_pr" => PostPr,
        "pre_ci" => PreCi,
        "post_ci" => PostCi,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn missing_document_yields_no_hooks() {
        let project = TestProject::new();
        let doc = load(&project.root.join(".sdp/hooks.toml")).unwrap();
        assert!(doc.get(HookKind::PreBuild).is_none());
    }

    #[test]
    fn parses_a_configured_hook() {
        let project = TestProject::new();
        project.write(
            ".sdp/hooks.toml",
            "[hooks.pre_build]\ncommand = [\"sh\", \"-c\", \"echo hi\"]\non_fail = \"warn\"\n",
        );
        let doc = load(&project.root.join(".sdp/hooks.toml")).unwrap();
        let spec = doc.get(HookKind::PreBuild).unwrap();
        assert_eq!(spec.command, vec!["sh".to_string(), "-c".to_string(), "echo hi".to_string()]);
    }

    #[test]
    fn unknown_phase_key_is_rejected() {
        let project = TestProject::new();
        project.write(".sdp/hooks.toml", "[hooks.pre_launch]\ncommand = [\"true\"]\n");
        let err = load(&project.root.join(".sdp/hooks.toml")).unwrap_err();
        assert!(matches!(err, HooksLoadError::UnknownPhaseKey(_)));
    }
}
