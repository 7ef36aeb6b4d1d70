//! Stagehand: publish generated post XML into the CMS staging tree.
//!
//! # Usage
//!
//! ```text
//! stagehand sync  [--config PATH] [--changes FILE|-] [--dry-run] [--json] [--notice-out PATH] [-v]
//! stagehand sweep [--config PATH] [-v]
//! stagehand classify <PATH>... [--today YYYY-MM-DD] [--json]
//! ```
//!
//! Exit status: `0` success, `1` usage or configuration error, `2` some
//! entries failed, `3` a configured root could not be read.

mod commands;

use std::process::ExitCode;

use anyhow::{Error, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{classify::ClassifyArgs, sweep::SweepArgs, sync::SyncArgs};
use stagehand_sync::SyncError;

/// Some entries, image transfers, or sweep deletions failed.
pub const EXIT_ENTRY_FAILURES: u8 = 2;
/// A configured root could not be read; nothing was reconciled.
pub const EXIT_FATAL_SETUP: u8 = 3;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    version,
    about = "Reconcile generated post XML with the CMS staging tree",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy new and changed post XML to the destination, delete removed posts,
    /// then sweep the build output.
    Sync(SyncArgs),

    /// Delete leftover generated XML under the HTML posts root.
    Sweep(SweepArgs),

    /// Show how paths are classified and where they would be published.
    Classify(ClassifyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Sweep(args) => args.run(),
        Commands::Classify(args) => args.run(),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &Error) -> ExitCode {
    let fatal = err
        .chain()
        .filter_map(|e| e.downcast_ref::<SyncError>())
        .any(SyncError::is_fatal_setup);
    if fatal {
        ExitCode::from(EXIT_FATAL_SETUP)
    } else {
        ExitCode::FAILURE
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Convenience alias used by every subcommand.
pub(crate) type CommandResult = Result<ExitCode>;
