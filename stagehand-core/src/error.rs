//! Error types for stagehand-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.stagehand/`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// The config parsed but is unusable (e.g. a required root is empty).
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from parsing a `git diff --name-status` listing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChangeListError {
    /// The status letter is not one stagehand understands.
    #[error("line {line}: unknown change status '{status}'")]
    UnknownStatus { line: usize, status: String },

    /// A status was present but the path column(s) were not.
    #[error("line {line}: expected {expected} path(s) after status '{status}'")]
    MissingPath {
        line: usize,
        status: String,
        expected: usize,
    },
}
