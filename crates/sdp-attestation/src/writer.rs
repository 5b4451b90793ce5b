//! Atomic persistence of the attestation statement at `.sdp/evidence/<FeatureID>.json`.

use crate::model::AttestationStatement;
use camino::{Utf8Path, Utf8PathBuf};
use sdp_utils::identifiers::FeatureId;

#[derive(Debug, thiserror::Error)]
pub enum AttestationWriteError {
    #[error("failed to serialize attestation statement to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to canonicalize attestation statement: {0}")]
    Canonicalize(String),
    #[error("failed to write attestation {path}: {source}")]
    Write { path: String, source: std::io::Error },
}

#[must_use]
pub fn evidence_path(project_root: &Utf8Path, feature_id: &FeatureId) -> Utf8PathBuf {
    project_root.join(".sdp").join("evidence").join(format!("{feature_id}.json"))
}

/// Serialize `statement` with stable (JCS-canonical) key ordering and write
/// it atomically to `.sdp/evidence/<FeatureID>.json`.
pub fn write(
    project_root: &Utf8Path,
    feature_id: &FeatureId,
    statement: &AttestationStatement,
) -> Result<Utf8PathBuf, AttestationWriteError> {
    let path = evidence_path(project_root, feature_id);
    let value = serde_json::to_value(statement).map_err(AttestationWriteError::Serialize)?;
    let bytes = serde_json_canonicalizer::to_vec(&value)
        .map_err(|err| AttestationWriteError::Canonicalize(err.to_string()))?;
    sdp_utils::atomic_write::write_atomic(&path, &bytes).map_err(|source| AttestationWriteError::Write {
        path: path.to_string(),
        source,
    })?;
    Ok(path)
}
