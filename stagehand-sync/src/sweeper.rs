//! Cleanup of the site generator's scratch XML output.
//!
//! Runs after every reconciliation regardless of the change set: anything
//! ending in the generated extension under the build output root is deleted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{fatal_setup, SyncError};
use crate::fs::{Filesystem, LocalFs};

/// Extension the site generator uses for per-post XML.
pub const GENERATED_EXTENSION: &str = "xml";

/// A file the sweeper could not remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub removed: usize,
    /// Matched, but gone by the time we tried to delete it.
    pub already_gone: usize,
    pub failed: Vec<SweepFailure>,
}

/// Sweep `root` on the local disk.
pub fn sweep(root: &Path, extension: &str, max_depth: usize) -> Result<SweepReport, SyncError> {
    sweep_with(&LocalFs, root, extension, max_depth)
}

/// Delete every file under `root` (down to `max_depth`) whose name ends in
/// `.<extension>`.
///
/// A missing root sweeps nothing. A root that exists but cannot be read is a
/// [`SyncError::FatalSetup`]. Per-file failures are collected, not returned.
pub fn sweep_with<F: Filesystem>(
    fs: &F,
    root: &Path,
    extension: &str,
    max_depth: usize,
) -> Result<SweepReport, SyncError> {
    let mut report = SweepReport::default();

    match std::fs::read_dir(root) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(report),
        Err(err) => return Err(fatal_setup(root, err)),
    }

    let suffix = format!(".{extension}");
    for item in WalkDir::new(root).max_depth(max_depth) {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!(error = %err, "sweep skipped unreadable entry");
                continue;
            }
        };
        if !item.file_type().is_file() || !item.file_name().to_string_lossy().ends_with(&suffix) {
            continue;
        }

        let path = item.path();
        match fs.remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "swept");
                report.removed += 1;
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "already removed");
                report.already_gone += 1;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "sweep failed to delete");
                report.failed.push(SweepFailure {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        root = %root.display(),
        removed = report.removed,
        failed = report.failed.len(),
        "sweep complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn removes_xml_and_keeps_everything_else() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("2020-01-05/hello/hello.xml"));
        touch(&root.join("2020-01-05/hello/index.html"));
        touch(&root.join("feed.xml"));

        let report = sweep(root, GENERATED_EXTENSION, 5).unwrap();
        assert_eq!(report.removed, 2);
        assert!(report.failed.is_empty());
        assert!(!root.join("feed.xml").exists());
        assert!(root.join("2020-01-05/hello/index.html").exists());
    }

    #[test]
    fn respects_max_depth() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let shallow = root.join("a/b.xml");
        let deep = root.join("a/b/c/d/e/f.xml");
        touch(&shallow);
        touch(&deep);

        let report = sweep(root, GENERATED_EXTENSION, 2).unwrap();
        assert_eq!(report.removed, 1);
        assert!(!shallow.exists());
        assert!(deep.exists());
    }

    #[test]
    fn missing_root_removes_nothing() {
        let tmp = TempDir::new().unwrap();
        let report = sweep(&tmp.path().join("no-site"), GENERATED_EXTENSION, 5).unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn file_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("site");
        touch(&file);
        let err = sweep(&file, GENERATED_EXTENSION, 5).unwrap_err();
        assert!(err.is_fatal_setup());
    }

    /// Deletes the file first, then reports NotFound, like a concurrent cleaner.
    struct RacingFs;

    impl Filesystem for RacingFs {
        fn modified(&self, path: &Path) -> io::Result<Option<FileTime>> {
            LocalFs.modified(path)
        }
        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            LocalFs.create_dir_all(path)
        }
        fn copy_preserving(&self, from: &Path, to: &Path) -> io::Result<()> {
            LocalFs.copy_preserving(from, to)
        }
        fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
            LocalFs.copy_file(from, to)
        }
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            fs::remove_file(path)?;
            Err(io::Error::new(ErrorKind::NotFound, "lost race"))
        }
        fn remove_dir(&self, path: &Path) -> io::Result<()> {
            LocalFs.remove_dir(path)
        }
        fn is_empty_dir(&self, dir: &Path) -> io::Result<bool> {
            LocalFs.is_empty_dir(dir)
        }
    }

    #[test]
    fn not_found_during_delete_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("2020-01-05/a/a.xml"));

        let report = sweep_with(&RacingFs, tmp.path(), GENERATED_EXTENSION, 5).unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(report.already_gone, 1);
        assert!(report.failed.is_empty());
    }
}
