//! Atomic file writes via the temp-file + fsync + rename pattern used
//! throughout the core for checkpoints, run logs, context packets, prompt
//! provenance and contract documents.

use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;

/// Write `content` to `path` atomically: create a temp file in the same
/// directory, fsync it, then rename onto `path`. On rename failure the temp
/// file is removed and the error propagated.
pub fn write_atomic(path: &Utf8Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    match temp.persist(path.as_std_path()) {
        Ok(_) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(e.file.path());
            Err(e.error)
        }
    }
}

/// Convenience wrapper for UTF-8 text content.
pub fn write_atomic_str(path: &Utf8Path, content: &str) -> io::Result<()> {
    write_atomic(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let target = root.join("a").join("b").join("out.json");
        write_atomic_str(&target, "{\"ok\":true}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn write_atomic_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let target = root.join("out.json");
        write_atomic_str(&target, "first").unwrap();
        write_atomic_str(&target, "second").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let target = root.join("out.json");
        write_atomic_str(&target, "x").unwrap();
        let entries: Vec<_> = fs::read_dir(root).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
