//! Error types for stagehand-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Run-level errors. Per-entry I/O failures never become a `SyncError`;
/// they are recorded as `Outcome::Failed` on the entry instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A configured root exists but cannot be read; nothing was reconciled.
    #[error("cannot read configured root {path}: {source}")]
    FatalSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (notices, reports).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn is_fatal_setup(&self) -> bool {
        matches!(self, SyncError::FatalSetup { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::FatalSetup`].
pub(crate) fn fatal_setup(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::FatalSetup {
        path: path.into(),
        source,
    }
}
