//! Shared test scaffolding: a throwaway project root with the `.sdp` marker
//! directory already created, so tests across crates don't each reinvent it.

use camino::Utf8PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

impl TestProject {
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        std::fs::create_dir_all(root.join(".sdp")).expect("create .sdp marker");
        Self { _dir: dir, root }
    }

    #[must_use]
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> Utf8PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
