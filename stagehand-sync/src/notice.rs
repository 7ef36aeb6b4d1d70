//! Alert payload for the external mail collaborator.
//!
//! Stagehand never sends mail itself; it writes a [`Notice`] that a mailer
//! picks up. A notice is only produced when something needs attention and a
//! recipient is configured.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};
use crate::pipeline::RunReport;

/// Subject + body addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notice {
    /// Build a notice for a run that completed with failures.
    ///
    /// Returns `None` when the run fully succeeded.
    pub fn from_report(report: &RunReport, recipient: &str) -> Option<Self> {
        if report.succeeded() {
            return None;
        }

        let mut body = String::new();
        let failed: Vec<_> = report.failures().collect();
        if !failed.is_empty() {
            body.push_str(&format!("{} artifact(s) failed to reconcile:\n", failed.len()));
            for r in &failed {
                let dest = r
                    .destination
                    .as_ref()
                    .map(|d| format!(" -> {}", d.display()))
                    .unwrap_or_default();
                let reason = r.reason.as_deref().unwrap_or("unknown error");
                body.push_str(&format!("  {}{dest}: {reason}\n", r.source.display()));
            }
        }
        if let Some(images) = report.images.as_ref().filter(|i| !i.failed.is_empty()) {
            body.push_str(&format!("{} image transfer(s) failed:\n", images.failed.len()));
            for f in &images.failed {
                body.push_str(&format!("  {}: {}\n", f.path.display(), f.error));
            }
        }
        if let Some(sweep) = report.sweep.as_ref().filter(|s| !s.failed.is_empty()) {
            body.push_str(&format!(
                "{} generated file(s) could not be swept:\n",
                sweep.failed.len()
            ));
            for f in &sweep.failed {
                body.push_str(&format!("  {}: {}\n", f.path.display(), f.error));
            }
        }

        let problems = failed.len()
            + report.images.as_ref().map_or(0, |i| i.failed.len())
            + report.sweep.as_ref().map_or(0, |s| s.failed.len());
        Some(Self {
            recipient: recipient.to_string(),
            subject: format!("stagehand: {problems} problem(s) during {} run", report.mode),
            body,
        })
    }

    /// Build a notice for a run that aborted before reconciling anything.
    pub fn fatal(err: &SyncError, recipient: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: "stagehand: run aborted".to_string(),
            body: format!("No artifacts were reconciled.\n\n{err}\n"),
        }
    }

    /// Write the notice as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| io_err(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageFailure, ImageReport};
    use crate::sweeper::{SweepFailure, SweepReport};
    use stagehand_core::{Outcome, ReconciliationResult};
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn report(results: Vec<ReconciliationResult>) -> RunReport {
        RunReport {
            mode: "diff",
            dry_run: false,
            results,
            images: None,
            sweep: None,
        }
    }

    #[test]
    fn no_notice_for_clean_run() {
        let r = report(vec![ReconciliationResult::new(
            "a.xml",
            Some(PathBuf::from("/cms/a.xml")),
            Outcome::Copied,
        )]);
        assert!(Notice::from_report(&r, "ops@example.com").is_none());
    }

    #[test]
    fn notice_lists_failures() {
        let r = report(vec![
            ReconciliationResult::new("ok.xml", None, Outcome::Copied),
            ReconciliationResult::new(
                "_site/2020-01-05/bad/bad.xml",
                Some(PathBuf::from("/cms/2020-01-05/2020-01-05-bad.xml")),
                Outcome::Failed,
            )
            .with_reason("copy: permission denied"),
        ]);
        let notice = Notice::from_report(&r, "ops@example.com").expect("notice");
        assert_eq!(notice.recipient, "ops@example.com");
        assert!(notice.subject.contains("1 problem"));
        assert!(notice.body.contains("bad.xml"));
        assert!(notice.body.contains("permission denied"));
        assert!(!notice.body.contains("ok.xml"));
    }

    #[test]
    fn notice_has_one_line_per_image_and_sweep_failure() {
        let mut r = report(Vec::new());
        r.images = Some(ImageReport {
            failed: vec![ImageFailure {
                path: PathBuf::from("gen/cover.png"),
                error: "disk full".into(),
            }],
            ..ImageReport::default()
        });
        r.sweep = Some(SweepReport {
            failed: vec![SweepFailure {
                path: PathBuf::from("_site/a/a.xml"),
                error: "busy".into(),
            }],
            ..SweepReport::default()
        });

        let notice = Notice::from_report(&r, "ops@example.com").expect("notice");
        assert!(notice.subject.contains("2 problem"));
        assert_eq!(
            notice.body,
            "1 image transfer(s) failed:\n  gen/cover.png: disk full\n\
             1 generated file(s) could not be swept:\n  _site/a/a.xml: busy\n"
        );
    }

    #[test]
    fn fatal_notice_carries_error() {
        let err = SyncError::FatalSetup {
            path: PathBuf::from("/srv/blog"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let notice = Notice::fatal(&err, "ops@example.com");
        assert!(notice.body.contains("/srv/blog"));
        assert!(notice.subject.contains("aborted"));
    }

    #[test]
    fn write_to_produces_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("notice.json");
        let notice = Notice {
            recipient: "a@b.c".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        notice.write_to(&path).unwrap();
        let back: Notice = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, notice);
    }
}
