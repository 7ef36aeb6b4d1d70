//! Shared run entrypoint: resolve → reconcile → mirror images → sweep.

use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use stagehand_core::{Layout, Outcome, PathClassifier, ReconciliationResult};

use crate::error::{fatal_setup, SyncError};
use crate::fs::{Filesystem, LocalFs};
use crate::images::{self, ImageReport};
use crate::resolver::{self, ChangeSource};
use crate::sweeper::{self, SweepReport, GENERATED_EXTENSION};
use crate::synchronizer::Synchronizer;

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report what would change without touching the filesystem.
    pub dry_run: bool,
    /// Evaluation date for future-post filtering; defaults to the local date.
    pub today: Option<NaiveDate>,
}

/// Everything a run did. Consumed by the CLI, `--json`, and notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mode: &'static str,
    pub dry_run: bool,
    pub results: Vec<ReconciliationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ImageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepReport>,
}

impl RunReport {
    /// False when any entry failed, or the image mirror or sweep hit errors.
    pub fn succeeded(&self) -> bool {
        !self.results.iter().any(ReconciliationResult::is_failure)
            && self.images.as_ref().map_or(true, |i| i.failed.is_empty())
            && self.sweep.as_ref().map_or(true, |s| s.failed.is_empty())
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

/// Run against the local disk.
pub fn run(
    layout: &Layout,
    source: &ChangeSource,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    run_with(layout, source, options, LocalFs)
}

/// Run the pipeline.
///
/// Returns [`SyncError::FatalSetup`] before touching anything when the
/// repository root, the HTML posts root or the change source cannot be read. Per-entry failures
/// are reported inside the [`RunReport`].
pub fn run_with<F: Filesystem>(
    layout: &Layout,
    source: &ChangeSource,
    options: RunOptions,
    fs: F,
) -> Result<RunReport, SyncError> {
    check_root(&layout.repo_root)?;
    check_build_root(&layout.html_posts_root)?;

    let entries = resolver::resolve(source, &layout.posts_prefix)?;
    tracing::info!(mode = source.label(), entries = entries.len(), "resolved change set");

    let classifier = options
        .today
        .map(PathClassifier::new)
        .unwrap_or_else(PathClassifier::today);
    let synchronizer = Synchronizer::with_fs(
        classifier,
        &layout.html_posts_root,
        &layout.destination_root,
        fs,
    )
    .dry_run(options.dry_run);
    let results = synchronizer.reconcile(&entries);
    let fs = synchronizer.into_fs();

    let mut report = RunReport {
        mode: source.label(),
        dry_run: options.dry_run,
        results,
        images: None,
        sweep: None,
    };
    if options.dry_run {
        return Ok(report);
    }

    if let Some(img) = &layout.images {
        report.images = Some(move_images(&fs, &img.source, &img.destination));
    }
    report.sweep = Some(sweeper::sweep_with(
        &fs,
        &layout.html_posts_root,
        GENERATED_EXTENSION,
        layout.sweep_depth,
    )?);

    tracing::info!(
        copied = report.count(Outcome::Copied),
        deleted = report.count(Outcome::Deleted),
        skipped = report.count(Outcome::Skipped),
        failed = report.count(Outcome::Failed),
        "run complete"
    );
    Ok(report)
}

/// Mirror the generated images, then clear the source tree if every copy
/// succeeded.
fn move_images<F: Filesystem>(fs: &F, src: &Path, dst: &Path) -> ImageReport {
    let mut report = images::mirror_tree(fs, src, dst);
    if !report.failed.is_empty() || report.copied == 0 {
        return report;
    }
    match images::remove_tree(fs, src) {
        Ok(n) => report.removed = n,
        Err(err) => {
            tracing::warn!(path = %src.display(), error = %err, "could not clear generated images");
            report.failed.push(images::ImageFailure {
                path: src.to_path_buf(),
                error: err.to_string(),
            });
        }
    }
    report
}

/// An unset root is not checked; a set one must be a readable directory.
fn check_root(root: &Path) -> Result<(), SyncError> {
    if root.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::read_dir(root)
        .map(|_| ())
        .map_err(|e| fatal_setup(root, e))
}

/// The build output may not exist yet; anything else unreadable is fatal.
fn check_build_root(root: &Path) -> Result<(), SyncError> {
    match std::fs::read_dir(root) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(fatal_setup(root, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use stagehand_core::{ImageConfig, VcsChange};
    use tempfile::TempDir;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn layout(tmp: &TempDir) -> Layout {
        Layout {
            repo_root: tmp.path().to_path_buf(),
            html_posts_root: tmp.path().join("_site/blog-posts"),
            destination_root: tmp.path().join("cms"),
            posts_prefix: PathBuf::from("_posts"),
            sweep_depth: 5,
            images: None,
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            dry_run: false,
            today: Some(today()),
        }
    }

    #[test]
    fn empty_scan_succeeds_and_still_sweeps() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let report = run(
            &layout,
            &ChangeSource::ScanRoot(layout.html_posts_root.clone()),
            options(),
        )
        .expect("run");
        assert!(report.results.is_empty());
        assert!(report.succeeded());
        assert_eq!(report.sweep, Some(SweepReport::default()));
    }

    #[test]
    fn scan_copies_then_sweeps_site_xml() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let src = layout.html_posts_root.join("2020-01-05/hello/hello.xml");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "<post/>").unwrap();

        let report = run(
            &layout,
            &ChangeSource::ScanRoot(layout.html_posts_root.clone()),
            options(),
        )
        .expect("run");

        assert_eq!(report.count(Outcome::Copied), 1);
        assert_eq!(report.sweep.as_ref().map(|s| s.removed), Some(1));
        assert!(!src.exists(), "site xml must be swept");
        assert!(layout
            .destination_root
            .join("2020-01-05/2020-01-05-hello.xml")
            .exists());
    }

    #[test]
    fn dry_run_skips_sweep_and_images() {
        let tmp = TempDir::new().unwrap();
        let mut layout = layout(&tmp);
        layout.images = Some(ImageConfig {
            source: tmp.path().join("gen-img"),
            destination: tmp.path().join("cms-img"),
        });
        let src = layout.html_posts_root.join("2020-01-05/hello/hello.xml");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "<post/>").unwrap();

        let report = run(
            &layout,
            &ChangeSource::ScanRoot(layout.html_posts_root.clone()),
            RunOptions {
                dry_run: true,
                ..options()
            },
        )
        .expect("run");

        assert_eq!(report.count(Outcome::WouldCopy), 1);
        assert!(report.sweep.is_none());
        assert!(report.images.is_none());
        assert!(src.exists());
    }

    #[test]
    fn missing_repo_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut layout = layout(&tmp);
        layout.repo_root = tmp.path().join("not-cloned");
        let err = run(
            &layout,
            &ChangeSource::DiffList(vec![VcsChange::added("_posts/2020-01-05-a.md")]),
            options(),
        )
        .unwrap_err();
        assert!(err.is_fatal_setup(), "got: {err}");
    }

    #[test]
    fn images_are_moved_after_reconcile() {
        let tmp = TempDir::new().unwrap();
        let mut layout = layout(&tmp);
        let img_src = tmp.path().join("gen-img");
        let img_dst = tmp.path().join("cms-img");
        fs::create_dir_all(img_src.join("2020-01-05")).unwrap();
        fs::write(img_src.join("2020-01-05/cover.png"), "png").unwrap();
        layout.images = Some(ImageConfig {
            source: img_src.clone(),
            destination: img_dst.clone(),
        });

        let report = run(&layout, &ChangeSource::DiffList(vec![]), options()).expect("run");

        let images = report.images.expect("image report");
        assert_eq!(images.copied, 1);
        assert_eq!(images.removed, 1);
        assert!(img_dst.join("2020-01-05/cover.png").exists());
        assert!(!img_src.exists());
    }

    #[test]
    fn unreadable_html_root_aborts_before_any_delete() {
        let tmp = TempDir::new().unwrap();
        let mut layout = layout(&tmp);
        layout.html_posts_root = tmp.path().join("site-file");
        fs::write(&layout.html_posts_root, "not a directory").unwrap();
        let dest = layout
            .destination_root
            .join("2020-01-05/2020-01-05-gone.xml");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "<post/>").unwrap();

        let err = run(
            &layout,
            &ChangeSource::DiffList(vec![VcsChange::deleted("_posts/2020-01-05-gone.md")]),
            options(),
        )
        .unwrap_err();

        assert!(err.is_fatal_setup(), "got: {err}");
        assert!(dest.exists(), "destination must be untouched");
    }

    #[test]
    fn missing_html_root_is_not_fatal_in_diff_mode() {
        let tmp = TempDir::new().unwrap();
        let mut layout = layout(&tmp);
        layout.html_posts_root = tmp.path().join("not-built");
        let report = run(
            &layout,
            &ChangeSource::DiffList(vec![VcsChange::deleted("_posts/2020-01-05-gone.md")]),
            options(),
        )
        .expect("run");
        assert_eq!(report.results[0].outcome, Outcome::Deleted);
    }

    #[test]
    fn failed_entry_marks_report_unsuccessful() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp);
        let report = run(
            &layout,
            &ChangeSource::DiffList(vec![VcsChange::added("_posts/2020-01-05-unbuilt.md")]),
            options(),
        )
        .expect("run");
        assert_eq!(report.results[0].outcome, Outcome::Failed);
        assert!(!report.succeeded());
        assert_eq!(report.failures().count(), 1);
    }
}
