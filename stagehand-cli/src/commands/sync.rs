//! `stagehand sync`: reconcile generated post XML with the destination tree.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;

use stagehand_core::{vcs, Outcome, VcsChange};
use stagehand_sync::{pipeline, ChangeSource, Notice, RunOptions, RunReport};

use super::load_config;
use crate::{CommandResult, EXIT_ENTRY_FAILURES};

/// Arguments for `stagehand sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Config file (default: ~/.stagehand/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// `git diff --name-status` listing to apply; `-` reads stdin.
    /// Without it the HTML posts root is rescanned.
    #[arg(long, value_name = "FILE")]
    pub changes: Option<PathBuf>,

    /// Show what would be copied or deleted without touching any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Write a failure notice here when the run needs attention and a
    /// recipient is configured.
    #[arg(long, value_name = "PATH")]
    pub notice_out: Option<PathBuf>,

    /// Evaluate publication dates against this day instead of the local date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

impl SyncArgs {
    pub fn run(self) -> CommandResult {
        let (config, layout) = load_config(self.config.as_deref())?;

        let source = match &self.changes {
            Some(path) => ChangeSource::DiffList(read_changes(path)?),
            None => ChangeSource::ScanRoot(layout.html_posts_root.clone()),
        };
        let options = RunOptions {
            dry_run: self.dry_run,
            today: self.today,
        };

        let report = match pipeline::run(&layout, &source, options) {
            Ok(report) => report,
            Err(err) => {
                if let (Some(out), Some(recipient)) = (&self.notice_out, config.recipient()) {
                    if let Err(write_err) = Notice::fatal(&err, recipient).write_to(out) {
                        tracing::warn!(path = %out.display(), error = %write_err, "could not write notice");
                    }
                }
                return Err(err).context("sync aborted");
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize run report")?
            );
        } else {
            print_report(&report);
        }

        if let (Some(out), Some(recipient)) = (&self.notice_out, config.recipient()) {
            if let Some(notice) = Notice::from_report(&report, recipient) {
                notice
                    .write_to(out)
                    .with_context(|| format!("failed to write notice to {}", out.display()))?;
            }
        }

        Ok(if report.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(EXIT_ENTRY_FAILURES)
        })
    }
}

fn read_changes(path: &Path) -> Result<Vec<VcsChange>> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read change list from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read change list {}", path.display()))?
    };
    vcs::parse_name_status(&text).context("invalid change list")
}

fn print_report(report: &RunReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let (copied, deleted) = if report.dry_run {
        (report.count(Outcome::WouldCopy), report.count(Outcome::WouldDelete))
    } else {
        (report.count(Outcome::Copied), report.count(Outcome::Deleted))
    };
    let failed = report.count(Outcome::Failed);
    let mark = if report.succeeded() {
        "✓".green()
    } else {
        "✗".red()
    };

    println!(
        "{prefix}{mark} {} run: {copied} copied, {deleted} deleted, {} skipped, {failed} failed",
        report.mode,
        report.count(Outcome::Skipped),
    );

    for r in &report.results {
        let dest = r
            .destination
            .as_deref()
            .unwrap_or(r.source.as_path())
            .display();
        match r.outcome {
            Outcome::Copied => println!("  {}  {dest}", "✎".green()),
            Outcome::Deleted => println!("  {}  {dest}", "-".red()),
            Outcome::WouldCopy | Outcome::WouldDelete => {
                println!("  {}  {dest} ({})", "~".yellow(), r.outcome)
            }
            Outcome::Failed => println!(
                "  {}  {}: {}",
                "✗".red().bold(),
                r.source.display(),
                r.reason.as_deref().unwrap_or("unknown error")
            ),
            Outcome::Skipped => {}
        }
    }

    if let Some(images) = &report.images {
        println!(
            "  images: {} copied, {} removed, {} failed",
            images.copied,
            images.removed,
            images.failed.len()
        );
        for f in &images.failed {
            println!("  {}  {}: {}", "✗".red().bold(), f.path.display(), f.error);
        }
    }
    if let Some(sweep) = &report.sweep {
        println!(
            "  sweep: {} removed, {} failed",
            sweep.removed,
            sweep.failed.len()
        );
        for f in &sweep.failed {
            println!("  {}  {}: {}", "✗".red().bold(), f.path.display(), f.error);
        }
    }
}
