//! Domain types for artifact reconciliation.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Everything here is transient: values are built per run and discarded.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Artifact classification
// ---------------------------------------------------------------------------

/// What a path holds, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A source post (`.markdown` / `.md`).
    Markdown,
    /// Per-post XML emitted by the site build.
    GeneratedXml,
    /// An image emitted by the site build.
    GeneratedImage,
    Other,
}

impl ArtifactKind {
    /// Derive the kind from a file extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "markdown" | "md" => ArtifactKind::Markdown,
            "xml" => ArtifactKind::GeneratedXml,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" => ArtifactKind::GeneratedImage,
            _ => ArtifactKind::Other,
        }
    }

    /// Derive the kind from a path's extension; no extension is `Other`.
    pub fn of_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ArtifactKind::Other)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Markdown => write!(f, "markdown"),
            ArtifactKind::GeneratedXml => write!(f, "xml"),
            ArtifactKind::GeneratedImage => write!(f, "image"),
            ArtifactKind::Other => write!(f, "other"),
        }
    }
}

/// A path broken down by the post naming convention.
///
/// Only [`crate::classifier::PathClassifier`] builds these; fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    pub(crate) raw: PathBuf,
    pub(crate) root: PathBuf,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) slug: String,
    pub(crate) kind: ArtifactKind,
}

impl ArtifactPath {
    /// The path exactly as it was given to the classifier.
    pub fn raw(&self) -> &Path {
        &self.raw
    }

    /// Directory portion preceding the date partition.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// `YYYY-MM-DD` rendering of the date partition, if any.
    pub fn date_partition(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// Canonical destination: `<dest_root>/<date>/<date>-<slug>.xml`.
    ///
    /// Pure; returns `None` only when the path carries no date.
    pub fn destination_in(&self, dest_root: &Path) -> Option<PathBuf> {
        let partition = self.date_partition()?;
        Some(
            dest_root
                .join(&partition)
                .join(format!("{partition}-{}.xml", self.slug)),
        )
    }

    /// Where the site build writes the XML for this post:
    /// `<html_root>/<date>/<slug>/<slug>.xml`.
    pub fn generated_xml_in(&self, html_root: &Path) -> Option<PathBuf> {
        let partition = self.date_partition()?;
        Some(
            html_root
                .join(partition)
                .join(&self.slug)
                .join(format!("{}.xml", self.slug)),
        )
    }
}

// ---------------------------------------------------------------------------
// Change set
// ---------------------------------------------------------------------------

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Add,
    Modify,
    Delete,
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOperation::Add => write!(f, "add"),
            ChangeOperation::Modify => write!(f, "modify"),
            ChangeOperation::Delete => write!(f, "delete"),
        }
    }
}

/// One unit of reconciliation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: PathBuf,
    pub operation: ChangeOperation,
}

impl ChangeEntry {
    pub fn new(path: impl Into<PathBuf>, operation: ChangeOperation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }
}

/// A single row of a version-control change list.
///
/// `old_path` is set for deletions (and the source side of renames),
/// `new_path` for additions and modifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsChange {
    pub change_type: ChangeOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
}

impl VcsChange {
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeOperation::Add,
            old_path: None,
            new_path: Some(path.into()),
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            change_type: ChangeOperation::Modify,
            old_path: Some(path.clone()),
            new_path: Some(path),
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeOperation::Delete,
            old_path: Some(path.into()),
            new_path: None,
        }
    }

    /// The path the change is about: the old path for deletions, the new
    /// path otherwise.
    pub fn effective_path(&self) -> Option<&str> {
        match self.change_type {
            ChangeOperation::Delete => self.old_path.as_deref(),
            ChangeOperation::Add | ChangeOperation::Modify => self.new_path.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Per-entry outcome of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Copied,
    Deleted,
    Skipped,
    Failed,
    /// `--dry-run`: the file *would* have been copied.
    WouldCopy,
    /// `--dry-run`: the file *would* have been deleted.
    WouldDelete,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Copied => write!(f, "copied"),
            Outcome::Deleted => write!(f, "deleted"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::WouldCopy => write!(f, "would copy"),
            Outcome::WouldDelete => write!(f, "would delete"),
        }
    }
}

/// What happened to one [`ChangeEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReconciliationResult {
    pub fn new(source: impl Into<PathBuf>, destination: Option<PathBuf>, outcome: Outcome) -> Self {
        Self {
            source: source.into(),
            destination,
            outcome,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
