//! Change-set resolution: turn a diff list or a directory scan into
//! [`ChangeEntry`] work items.
//!
//! Eligibility is not decided here. Diff mode only narrows to the posts
//! prefix; scan mode emits every regular file and leaves filtering to the
//! classifier in the synchronizer.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use stagehand_core::{ChangeEntry, ChangeOperation, VcsChange};

use crate::error::{fatal_setup, SyncError};

/// Where the work items come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    /// Explicit version-control changes, paths relative to the repository.
    DiffList(Vec<VcsChange>),
    /// Rescan everything under a directory.
    ScanRoot(PathBuf),
}

impl ChangeSource {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeSource::DiffList(_) => "diff",
            ChangeSource::ScanRoot(_) => "scan",
        }
    }
}

/// Produce the ordered work items for `source`.
///
/// `posts_prefix` only applies to [`ChangeSource::DiffList`].
pub fn resolve(source: &ChangeSource, posts_prefix: &Path) -> Result<Vec<ChangeEntry>, SyncError> {
    match source {
        ChangeSource::DiffList(changes) => Ok(from_diff(changes, posts_prefix)),
        ChangeSource::ScanRoot(root) => scan(root),
    }
}

fn from_diff(changes: &[VcsChange], posts_prefix: &Path) -> Vec<ChangeEntry> {
    let prefix = normalize(posts_prefix);
    changes
        .iter()
        .filter_map(|change| {
            let raw = change.effective_path()?;
            let path = normalize(Path::new(raw));
            if !path.starts_with(&prefix) {
                tracing::debug!(path = %raw, "outside posts prefix");
                return None;
            }
            Some(ChangeEntry::new(path, change.change_type))
        })
        .collect()
}

/// Drop `.` components so `./_posts/x.md` matches a `_posts` prefix.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn scan(root: &Path) -> Result<Vec<ChangeEntry>, SyncError> {
    match std::fs::read_dir(root) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!(root = %root.display(), "scan root missing; nothing to resolve");
            return Ok(Vec::new());
        }
        Err(err) => return Err(fatal_setup(root, err)),
    }

    let mut entries = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                let at = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                tracing::warn!(path = %at, error = %err, "skipping unreadable entry during scan");
                continue;
            }
        };
        if item.file_type().is_file() {
            entries.push(ChangeEntry::new(item.into_path(), ChangeOperation::Add));
        }
    }
    tracing::debug!(root = %root.display(), files = entries.len(), "scan complete");
    Ok(entries)
}
