//! `stagehand sweep`: delete leftover generated XML without reconciling.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use colored::Colorize;

use stagehand_sync::{sweep, GENERATED_EXTENSION};

use super::load_config;
use crate::{CommandResult, EXIT_ENTRY_FAILURES};

/// Arguments for `stagehand sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Config file (default: ~/.stagehand/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the sweep report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SweepArgs {
    pub fn run(self) -> CommandResult {
        let (_, layout) = load_config(self.config.as_deref())?;
        let root = &layout.html_posts_root;
        let report = sweep(root, GENERATED_EXTENSION, layout.sweep_depth)
            .with_context(|| format!("sweep failed for {}", root.display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize sweep report")?
            );
        } else if report.failed.is_empty() {
            println!(
                "{} swept {} file(s) under {}",
                "✓".green(),
                report.removed,
                root.display()
            );
        } else {
            println!(
                "{} swept {} file(s) under {}, {} could not be removed",
                "✗".red(),
                report.removed,
                root.display(),
                report.failed.len()
            );
            for f in &report.failed {
                println!("  {}  {}: {}", "✗".red().bold(), f.path.display(), f.error);
            }
        }

        Ok(if report.failed.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(EXIT_ENTRY_FAILURES)
        })
    }
}
