//! Atomic checkpoint persistence at `.sdp/checkpoints/<FeatureID>.json`.
//!
//! The supervisor is the single writer of a feature's checkpoint; readers
//! tolerate a missing file by returning `None` rather than an error.

use crate::model::Checkpoint;
use camino::{Utf8Path, Utf8PathBuf};
use sdp_utils::identifiers::FeatureId;
use std::fs;

/// Checkpoint files beyond this size cannot be a legitimate record; treat
/// them as corrupt rather than attempting to decode.
const MAX_CHECKPOINT_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to read checkpoint {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("checkpoint {path} exceeds the maximum accepted size ({size} bytes)")]
    TooLarge { path: String, size: u64 },
    #[error("failed to parse checkpoint {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("failed to write checkpoint {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("checkpoint updated_at must not move backwards: previous {previous}, attempted {attempted}")]
    NonMonotonicUpdate {
        previous: chrono::DateTime<chrono::Utc>,
        attempted: chrono::DateTime<chrono::Utc>,
    },
}

#[must_use]
pub fn checkpoint_path(project_root: &Utf8Path, feature_id: &FeatureId) -> Utf8PathBuf {
    project_root.join(".sdp").join("checkpoints").join(format!("{feature_id}.json"))
}

/// Load the checkpoint for `feature_id`. A missing file is not an error: it
/// means the feature has not been initialized yet.
pub fn load(project_root: &Utf8Path, feature_id: &FeatureId) -> Result<Option<Checkpoint>, CheckpointError> {
    let path = checkpoint_path(project_root, feature_id);
    if !path.exists() {
        return Ok(None);
    }
    let metadata = fs::metadata(&path).map_err(|source| CheckpointError::Read {
        path: path.to_string(),
        source,
    })?;
    if metadata.len() > MAX_CHECKPOINT_BYTES {
        return Err(CheckpointError::TooLarge {
            path: path.to_string(),
            size: metadata.len(),
        });
    }
    let bytes = fs::read(&path).map_err(|source| CheckpointError::Read {
        path: path.to_string(),
        source,
    })?;
    let checkpoint = serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Parse {
        path: path.to_string(),
        source,
    })?;
    Ok(Some(checkpoint))
}

/// Persist `checkpoint` atomically. Rejects a save whose `updated_at` would
/// move backwards relative to the checkpoint currently on disk.
pub fn save(project_root: &Utf8Path, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    if let Some(existing) = load(project_root, &checkpoint.feature_id)? {
        if checkpoint.updated_at < existing.updated_at {
            return Err(CheckpointError::NonMonotonicUpdate {
                previous: existing.updated_at,
                attempted: checkpoint.updated_at,
            });
        }
    }
    let path = checkpoint_path(project_root, &checkpoint.feature_id);
    let bytes = serde_json::to_vec_pretty(checkpoint)?;
    sdp_utils::atomic_write::write_atomic(&path, &bytes).map_err(|source| CheckpointError::Write {
        path: path.to_string(),
        source,
    })
}
