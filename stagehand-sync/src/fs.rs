//! Filesystem seam for the synchronizer, sweeper and image mirror.
//!
//! [`LocalFs`] is the real implementation. Tests wrap it to count calls or
//! inject failures on specific paths.

use std::io::{self, ErrorKind};
use std::path::Path;

use filetime::FileTime;

/// Mutating filesystem operations used during reconciliation.
pub trait Filesystem {
    /// Modification time of `path`, or `None` if it does not exist.
    fn modified(&self, path: &Path) -> io::Result<Option<FileTime>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` over `to`, keeping permissions and access/modification times.
    fn copy_preserving(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy `from` over `to` without carrying timestamps.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Whether `dir` has no entries.
    fn is_empty_dir(&self, dir: &Path) -> io::Result<bool>;

    /// Remove `dir` if it has no entries. Returns whether it was removed.
    fn remove_dir_if_empty(&self, dir: &Path) -> io::Result<bool> {
        if !self.is_empty_dir(dir)? {
            return Ok(false);
        }
        self.remove_dir(dir)?;
        Ok(true)
    }
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn modified(&self, path: &Path) -> io::Result<Option<FileTime>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(FileTime::from_last_modification_time(&meta))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy_preserving(&self, from: &Path, to: &Path) -> io::Result<()> {
        let meta = std::fs::metadata(from)?;
        // `fs::copy` carries permission bits; timestamps are set explicitly.
        std::fs::copy(from, to)?;
        filetime::set_file_times(
            to,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn is_empty_dir(&self, dir: &Path) -> io::Result<bool> {
        Ok(std::fs::read_dir(dir)?.next().is_none())
    }
}
