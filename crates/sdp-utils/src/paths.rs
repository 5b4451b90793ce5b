//! Project-root resolution and path-traversal guards.

use camino::{Utf8Path, Utf8PathBuf};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("path {0:?} escapes project root {1:?}")]
    Traversal(String, String),
    #[error("no project root found starting from {0:?} (no .sdp directory in any ancestor)")]
    RootNotFound(String),
    #[error("path is not valid UTF-8: {0}")]
    NotUtf8(String),
}

/// The marker directory that identifies a project root.
pub const MARKER_DIR: &str = ".sdp";

/// Walk upward from `start` looking for a directory containing [`MARKER_DIR`].
/// Returns `start` itself if no marker is found anywhere above it and
/// `start` is a plausible root (last resort, never errors the caller out of
/// a fresh project).
pub fn resolve_project_root(start: &Utf8Path) -> Result<Utf8PathBuf, PathError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(MARKER_DIR).is_dir() {
            return Ok(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Err(PathError::RootNotFound(start.to_string())),
        }
    }
}

/// Join `relative` onto `root` and verify the resulting path does not escape
/// `root` via `..` traversal or an absolute path substitution. Does not
/// require the path to exist.
pub fn guarded_join(root: &Utf8Path, relative: &str) -> Result<Utf8PathBuf, PathError> {
    let candidate = Utf8Path::new(relative);
    if candidate.is_absolute() {
        return Err(PathError::Traversal(relative.to_string(), root.to_string()));
    }
    let joined = root.join(candidate);
    let normalized = normalize(&joined);
    let normalized_root = normalize(root);
    if !normalized.starts_with(&normalized_root) {
        return Err(PathError::Traversal(relative.to_string(), root.to_string()));
    }
    Ok(joined)
}

/// Lexical normalization (no filesystem access): resolves `.` and `..`
/// components without requiring the path to exist.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component.as_str() {
            "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(component.as_str()),
        }
    }
    out
}

/// Convert a `std::path::Path` to [`Utf8Path`], erroring on non-UTF-8 input.
pub fn require_utf8(path: &Path) -> Result<Utf8PathBuf, PathError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|p| PathError::NotUtf8(p.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_join_allows_in_scope_paths() {
        let root = Utf8Path::new("/proj");
        assert!(guarded_join(root, "internal/guard/x.go").is_ok());
    }

    #[test]
    fn guarded_join_rejects_traversal() {
        let root = Utf8Path::new("/proj");
        assert!(guarded_join(root, "../../etc/passwd").is_err());
        assert!(guarded_join(root, "/etc/passwd").is_err());
    }

    #[test]
    fn resolve_project_root_finds_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join(".sdp")).unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = resolve_project_root(&nested).unwrap();
        assert_eq!(found, root);
    }
}
