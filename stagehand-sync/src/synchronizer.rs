//! Artifact reconciliation.
//!
//! ## Per-entry protocol
//!
//! 1. Classify the entry path; ineligible → `Skipped`.
//! 2. Destination = `<destination_root>/<date>/<date>-<slug>.xml`.
//! 3. `Delete` → remove the destination, then its date directory if that
//!    left it empty (one level).
//! 4. `Add` / `Modify` → copy when the destination is missing or its
//!    modification time differs from the source; otherwise `Skipped`.
//! 5. I/O errors become `Failed` on that entry only.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use stagehand_core::{
    ArtifactKind, ArtifactPath, ChangeEntry, ChangeOperation, Layout, Outcome, PathClassifier,
    ReconciliationResult,
};

use crate::fs::{Filesystem, LocalFs};

/// Batch processor over [`ChangeEntry`] values. Holds no per-run state.
#[derive(Debug, Clone)]
pub struct Synchronizer<F: Filesystem = LocalFs> {
    classifier: PathClassifier,
    html_posts_root: PathBuf,
    destination_root: PathBuf,
    dry_run: bool,
    fs: F,
}

impl Synchronizer<LocalFs> {
    pub fn new(
        classifier: PathClassifier,
        html_posts_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
    ) -> Self {
        Self::with_fs(classifier, html_posts_root, destination_root, LocalFs)
    }

    pub fn from_layout(layout: &Layout, classifier: PathClassifier) -> Self {
        Self::new(classifier, &layout.html_posts_root, &layout.destination_root)
    }
}

impl<F: Filesystem> Synchronizer<F> {
    pub fn with_fs(
        classifier: PathClassifier,
        html_posts_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        fs: F,
    ) -> Self {
        Self {
            classifier,
            html_posts_root: html_posts_root.into(),
            destination_root: destination_root.into(),
            dry_run: false,
            fs,
        }
    }

    /// In dry-run mode nothing is written; copies and deletes are reported
    /// as `WouldCopy` / `WouldDelete`.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn into_fs(self) -> F {
        self.fs
    }

    /// Reconcile every entry, in order. Never stops early.
    pub fn reconcile(&self, entries: &[ChangeEntry]) -> Vec<ReconciliationResult> {
        entries.iter().map(|e| self.reconcile_entry(e)).collect()
    }

    /// Reconcile a single entry.
    pub fn reconcile_entry(&self, entry: &ChangeEntry) -> ReconciliationResult {
        let artifact = match self.classifier.classify(&entry.path) {
            Ok(artifact) => artifact,
            Err(reason) => {
                tracing::debug!(path = %entry.path.display(), %reason, "skipped");
                return ReconciliationResult::new(&entry.path, None, Outcome::Skipped)
                    .with_reason(reason.to_string());
            }
        };

        let Some(dest) = artifact.destination_in(&self.destination_root) else {
            // classify() guarantees a date; keep the entry visible regardless.
            return ReconciliationResult::new(&entry.path, None, Outcome::Skipped)
                .with_reason("no date partition");
        };

        match entry.operation {
            ChangeOperation::Delete => self.delete(&entry.path, dest),
            ChangeOperation::Add | ChangeOperation::Modify => {
                let source = self.source_of(&artifact);
                self.copy_if_changed(source, dest)
            }
        }
    }

    /// The file whose bytes end up at the destination.
    fn source_of(&self, artifact: &ArtifactPath) -> PathBuf {
        match artifact.kind() {
            ArtifactKind::Markdown => artifact
                .generated_xml_in(&self.html_posts_root)
                .unwrap_or_else(|| artifact.raw().to_path_buf()),
            _ => artifact.raw().to_path_buf(),
        }
    }

    fn copy_if_changed(&self, source: PathBuf, dest: PathBuf) -> ReconciliationResult {
        let result = |outcome: Outcome| {
            ReconciliationResult::new(&source, Some(dest.clone()), outcome)
        };

        let source_mtime = match self.fs.modified(&source) {
            Ok(Some(mtime)) => mtime,
            Ok(None) => {
                tracing::warn!(path = %source.display(), "generated artifact missing");
                return result(Outcome::Failed).with_reason("source artifact not found");
            }
            Err(err) => return result(Outcome::Failed).with_reason(describe("stat source", &err)),
        };
        let dest_mtime = match self.fs.modified(&dest) {
            Ok(mtime) => mtime,
            Err(err) => {
                return result(Outcome::Failed).with_reason(describe("stat destination", &err))
            }
        };

        if dest_mtime == Some(source_mtime) {
            tracing::debug!(path = %dest.display(), "unchanged");
            return result(Outcome::Skipped).with_reason("unchanged (timestamps match)");
        }

        if self.dry_run {
            tracing::info!("[dry-run] would copy: {}", dest.display());
            return result(Outcome::WouldCopy);
        }

        if let Some(parent) = dest.parent() {
            if let Err(err) = self.fs.create_dir_all(parent) {
                return result(Outcome::Failed).with_reason(describe("create directory", &err));
            }
        }
        if let Err(err) = self.fs.copy_preserving(&source, &dest) {
            tracing::error!(path = %dest.display(), error = %err, "copy failed");
            return result(Outcome::Failed).with_reason(describe("copy", &err));
        }

        tracing::info!(path = %dest.display(), "copied");
        result(Outcome::Copied)
    }

    fn delete(&self, entry_path: &Path, dest: PathBuf) -> ReconciliationResult {
        let result = |outcome: Outcome| {
            ReconciliationResult::new(entry_path, Some(dest.clone()), outcome)
        };

        if self.dry_run {
            tracing::info!("[dry-run] would delete: {}", dest.display());
            return result(Outcome::WouldDelete);
        }

        let mut reason = None;
        match self.fs.remove_file(&dest) {
            Ok(()) => tracing::info!(path = %dest.display(), "deleted"),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %dest.display(), "already absent");
                reason = Some("destination already absent".to_string());
            }
            Err(err) => {
                tracing::error!(path = %dest.display(), error = %err, "delete failed");
                return result(Outcome::Failed).with_reason(describe("delete", &err));
            }
        }

        if let Err(err) = self.prune_date_dir(&dest) {
            return result(Outcome::Failed)
                .with_reason(describe("remove empty date directory", &err));
        }

        match reason {
            Some(reason) => result(Outcome::Deleted).with_reason(reason),
            None => result(Outcome::Deleted),
        }
    }

    /// Remove the destination's parent if it is an empty directory strictly
    /// inside the destination root.
    fn prune_date_dir(&self, dest: &Path) -> io::Result<()> {
        let Some(dir) = dest.parent() else {
            return Ok(());
        };
        if dir == self.destination_root || !dir.starts_with(&self.destination_root) {
            return Ok(());
        }
        match self.fs.remove_dir_if_empty(dir) {
            Ok(true) => {
                tracing::info!(path = %dir.display(), "removed empty date directory");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn describe(action: &str, err: &io::Error) -> String {
    format!("{action}: {err}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn classifier() -> PathClassifier {
        PathClassifier::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    struct Roots {
        _tmp: TempDir,
        html: PathBuf,
        dest: PathBuf,
    }

    fn roots() -> Roots {
        let tmp = TempDir::new().unwrap();
        let html = tmp.path().join("_site").join("blog-posts");
        let dest = tmp.path().join("cms");
        fs::create_dir_all(&html).unwrap();
        Roots {
            _tmp: tmp,
            html,
            dest,
        }
    }

    fn generated(html: &Path, date: &str, slug: &str, body: &str) -> PathBuf {
        let dir = html.join(date).join(slug);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{slug}.xml"));
        fs::write(&path, body).unwrap();
        let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(600));
        set_file_mtime(&path, old).unwrap();
        path
    }

    #[test]
    fn markdown_add_copies_generated_xml() {
        let r = roots();
        generated(&r.html, "2020-01-05", "hello-world", "<post/>");
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);

        let out = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-hello-world.markdown",
            ChangeOperation::Add,
        ));

        let dest = r.dest.join("2020-01-05").join("2020-01-05-hello-world.xml");
        assert_eq!(out.outcome, Outcome::Copied, "{out:?}");
        assert_eq!(out.destination.as_deref(), Some(dest.as_path()));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "<post/>");
    }

    #[test]
    fn modify_is_treated_like_add() {
        let r = roots();
        generated(&r.html, "2020-01-05", "hello", "<v2/>");
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        let out = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-hello.md",
            ChangeOperation::Modify,
        ));
        assert_eq!(out.outcome, Outcome::Copied);
    }

    #[test]
    fn missing_generated_source_fails() {
        let r = roots();
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        let out = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-never-built.md",
            ChangeOperation::Add,
        ));
        assert_eq!(out.outcome, Outcome::Failed);
        assert!(out.reason.unwrap().contains("not found"));
    }

    #[test]
    fn changed_mtime_triggers_recopy() {
        let r = roots();
        let src = generated(&r.html, "2020-01-05", "hello", "<v1/>");
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        let entry = ChangeEntry::new(&src, ChangeOperation::Add);
        assert_eq!(sync.reconcile_entry(&entry).outcome, Outcome::Copied);

        fs::write(&src, "<v2/>").unwrap();
        set_file_mtime(&src, FileTime::now()).unwrap();

        assert_eq!(sync.reconcile_entry(&entry).outcome, Outcome::Copied);
        let dest = r.dest.join("2020-01-05/2020-01-05-hello.xml");
        assert_eq!(fs::read_to_string(dest).unwrap(), "<v2/>");
    }

    #[test]
    fn delete_of_absent_destination_is_deleted_with_reason() {
        let r = roots();
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        let out = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-ghost.md",
            ChangeOperation::Delete,
        ));
        assert_eq!(out.outcome, Outcome::Deleted);
        assert_eq!(out.reason.as_deref(), Some("destination already absent"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let r = roots();
        generated(&r.html, "2020-01-05", "hello", "<post/>");
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest).dry_run(true);

        let copy = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-hello.md",
            ChangeOperation::Add,
        ));
        assert_eq!(copy.outcome, Outcome::WouldCopy);
        assert!(!r.dest.exists(), "dry-run must not create the destination");

        let delete = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-hello.md",
            ChangeOperation::Delete,
        ));
        assert_eq!(delete.outcome, Outcome::WouldDelete);
    }

    #[test]
    fn ineligible_entry_is_skipped_with_reason() {
        let r = roots();
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        let out = sync.reconcile_entry(&ChangeEntry::new(
            "_posts/2020-01-05-hello/cover.png",
            ChangeOperation::Add,
        ));
        assert_eq!(out.outcome, Outcome::Skipped);
        assert!(out.destination.is_none());
        assert!(out.reason.unwrap().contains("unsupported"));
    }

    #[test]
    fn prune_never_removes_destination_root() {
        let r = roots();
        fs::create_dir_all(&r.dest).unwrap();
        let sync = Synchronizer::new(classifier(), &r.html, &r.dest);
        sync.prune_date_dir(&r.dest.join("stray.xml")).unwrap();
        assert!(r.dest.exists());
    }
}
