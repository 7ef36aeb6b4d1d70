//! Generated image mirroring.
//!
//! Both traversals use an explicit worklist instead of recursion, so deep or
//! malformed trees cannot exhaust the stack.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs::Filesystem;

/// A path that could not be mirrored or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of mirroring (and then clearing) the generated image tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub copied: usize,
    /// Files removed from the source tree after a clean mirror.
    pub removed: usize,
    pub failed: Vec<ImageFailure>,
}

impl ImageReport {
    fn fail(&mut self, path: &Path, err: &io::Error) {
        tracing::warn!(path = %path.display(), error = %err, "image transfer failed");
        self.failed.push(ImageFailure {
            path: path.to_path_buf(),
            error: err.to_string(),
        });
    }
}

/// Copy every file under `src` to the same relative path under `dst`,
/// replacing existing files. A missing `src` copies nothing.
pub fn mirror_tree<F: Filesystem>(fs: &F, src: &Path, dst: &Path) -> ImageReport {
    let mut report = ImageReport::default();
    if !src.is_dir() {
        tracing::debug!(path = %src.display(), "no generated images");
        return report;
    }

    let mut work = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from_dir, to_dir)) = work.pop() {
        if let Err(err) = fs.create_dir_all(&to_dir) {
            report.fail(&to_dir, &err);
            continue;
        }
        let children = match sorted_children(&from_dir) {
            Ok(children) => children,
            Err(err) => {
                report.fail(&from_dir, &err);
                continue;
            }
        };
        for (child, is_dir) in children {
            let Some(name) = child.file_name() else {
                continue;
            };
            let target = to_dir.join(name);
            if is_dir {
                work.push((child, target));
                continue;
            }
            match fs.copy_file(&child, &target) {
                Ok(()) => {
                    tracing::debug!(path = %target.display(), "copied image");
                    report.copied += 1;
                }
                Err(err) => report.fail(&child, &err),
            }
        }
    }
    report
}

enum Visit {
    File(PathBuf),
    Enter(PathBuf),
    Leave(PathBuf),
}

/// Delete `root` and everything under it: files as they are visited,
/// directories after their contents. Returns the number of files removed.
///
/// A missing root removes nothing. The first failure stops the walk.
pub fn remove_tree<F: Filesystem>(fs: &F, root: &Path) -> io::Result<usize> {
    match std::fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            fs.remove_file(root)?;
            return Ok(1);
        }
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    }

    let mut removed = 0;
    let mut work = vec![Visit::Enter(root.to_path_buf())];
    while let Some(visit) = work.pop() {
        match visit {
            Visit::File(path) => {
                fs.remove_file(&path)?;
                removed += 1;
            }
            Visit::Enter(dir) => {
                let children = sorted_children(&dir)?;
                work.push(Visit::Leave(dir));
                for (child, is_dir) in children {
                    work.push(if is_dir {
                        Visit::Enter(child)
                    } else {
                        Visit::File(child)
                    });
                }
            }
            Visit::Leave(dir) => fs.remove_dir(&dir)?,
        }
    }
    Ok(removed)
}

/// Directory entries sorted by name, flagged as directory or not.
/// Symlinks are never followed.
fn sorted_children(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        children.push((entry.path(), is_dir));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children)
}
