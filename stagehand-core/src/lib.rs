//! Stagehand core library: domain types, path classification, change lists,
//! configuration.
//!
//! - [`types`]: artifact paths, change entries, reconciliation results
//! - [`classifier`]: [`PathClassifier`] and [`Ineligible`]
//! - [`vcs`]: `git diff --name-status` parsing
//! - [`config`]: YAML config load / env overrides / [`Layout`]
//! - [`error`]: [`ConfigError`], [`ChangeListError`]

pub mod classifier;
pub mod config;
pub mod error;
pub mod types;
pub mod vcs;

pub use classifier::{Ineligible, PathClassifier};
pub use config::{Config, ImageConfig, Layout, NotifyConfig};
pub use error::{ChangeListError, ConfigError};
pub use types::{
    ArtifactKind, ArtifactPath, ChangeEntry, ChangeOperation, Outcome, ReconciliationResult,
    VcsChange,
};
