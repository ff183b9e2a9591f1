//! Ephemeral output paths for fetched content.
//!
//! Each allocation gets its own private directory under the ephemeral area,
//! and the handed-out path points at a not-yet-existing entry inside it. The
//! daemon decides what ends up there (a file, or a directory tree for
//! directory CIDs). Dropping the [`EphemeralPath`] removes the whole private
//! directory, whether or not anything was ever written.
//!
//! Layout:
//! ```text
//! {area}/
//! └── cachipfs-Xa8Qk2/     # private dir, removed on drop
//!     └── content          # the path handed to the daemon
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

/// Prefix of the private directories created in the area.
pub const DIR_PREFIX: &str = "cachipfs-";

/// File name of the path handed out inside each private directory.
pub const ENTRY_NAME: &str = "content";

/// A directory in which ephemeral paths are allocated.
#[derive(Debug, Clone)]
pub struct EphemeralArea {
    root: PathBuf,
}

impl EphemeralArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The system temporary directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a unique path. The path itself is not created.
    pub fn allocate(&self) -> io::Result<EphemeralPath> {
        fs::create_dir_all(&self.root)?;
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(&self.root)?;
        let path = dir.path().join(ENTRY_NAME);
        Ok(EphemeralPath {
            dir: Some(dir),
            path,
        })
    }
}

impl Default for EphemeralArea {
    fn default() -> Self {
        Self::system()
    }
}

/// A path that lives for one operation.
#[derive(Debug)]
pub struct EphemeralPath {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl EphemeralPath {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the daemon (or anyone) has created something at the path.
    pub fn is_populated(&self) -> bool {
        self.path.exists()
    }

    /// Remove the path now, reporting failures instead of logging them.
    pub fn release(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => remove(dir),
            None => Ok(()),
        }
    }
}

impl AsRef<Path> for EphemeralPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralPath {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = remove(dir) {
                warn!(path = %self.path.display(), error = %e, "failed to remove ephemeral path");
            }
        }
    }
}

fn remove(dir: TempDir) -> io::Result<()> {
    match dir.close() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_does_not_create_path() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let eph = area.allocate().unwrap();
        assert!(eph.path().starts_with(temp.path()));
        assert!(!eph.is_populated());
        assert!(eph.path().parent().unwrap().exists());
    }

    #[test]
    fn test_allocations_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let a = area.allocate().unwrap();
        let b = area.allocate().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_drop_removes_written_file() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let eph = area.allocate().unwrap();
        fs::write(eph.path(), b"fetched").unwrap();
        let dir = eph.path().parent().unwrap().to_path_buf();
        assert!(eph.is_populated());

        drop(eph);
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_removes_directory_tree() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let eph = area.allocate().unwrap();
        fs::create_dir_all(eph.path().join("nested")).unwrap();
        fs::write(eph.path().join("nested/file"), b"x").unwrap();
        let dir = eph.path().parent().unwrap().to_path_buf();

        drop(eph);
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_tolerates_never_written_path() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let eph = area.allocate().unwrap();
        let dir = eph.path().parent().unwrap().to_path_buf();
        drop(eph);
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_release_tolerates_already_removed_dir() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path());

        let eph = area.allocate().unwrap();
        fs::remove_dir_all(eph.path().parent().unwrap()).unwrap();
        eph.release().unwrap();
    }

    #[test]
    fn test_allocate_creates_missing_area() {
        let temp = TempDir::new().unwrap();
        let area = EphemeralArea::new(temp.path().join("not/yet/here"));

        let eph = area.allocate().unwrap();
        assert!(area.root().exists());
        drop(eph);
    }
}
