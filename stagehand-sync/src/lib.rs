//! # stagehand-sync
//!
//! Reconciles generated post artifacts between the site build output and the
//! CMS destination tree.
//!
//! Call [`run`] to resolve a change set, copy or delete the matching
//! artifacts, mirror generated images, and sweep leftover scratch XML. The
//! individual stages are exposed for callers that want only one of them.

pub mod error;
pub mod fs;
pub mod images;
pub mod notice;
pub mod pipeline;
pub mod resolver;
pub mod sweeper;
pub mod synchronizer;

pub use error::SyncError;
pub use fs::{Filesystem, LocalFs};
pub use images::{ImageFailure, ImageReport};
pub use notice::Notice;
pub use pipeline::{run, run_with, RunOptions, RunReport};
pub use resolver::{resolve, ChangeSource};
pub use sweeper::{sweep, sweep_with, SweepFailure, SweepReport, GENERATED_EXTENSION};
pub use synchronizer::Synchronizer;
