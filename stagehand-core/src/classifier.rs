//! Path classification by the post naming convention.
//!
//! Two shapes are recognised:
//!
//! ```text
//! _posts/2020-01-05-hello-world.markdown          date + slug in the file name
//! _site/blog-posts/2020-01-05/hello-world/hello-world.xml
//!                                                  date as a parent/grandparent dir
//! ```
//!
//! [`PathClassifier::parse`] only splits a path; [`PathClassifier::classify`]
//! also decides eligibility. Neither touches the filesystem.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::{ArtifactKind, ArtifactPath};

static DATED_STEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:-(.*))?$").expect("dated stem pattern compiles")
});

static DATE_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date dir pattern compiles"));

/// Why a path was not eligible for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    #[error("unsupported artifact kind: {0}")]
    UnsupportedKind(ArtifactKind),

    #[error("no YYYY-MM-DD date segment")]
    MissingDate,

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("future date {0} (not yet published)")]
    FutureDate(NaiveDate),

    #[error("missing slug")]
    MissingSlug,
}

/// Splits paths into [`ArtifactPath`]s and judges eligibility against a
/// fixed "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathClassifier {
    today: NaiveDate,
}

impl PathClassifier {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Classifier evaluated against the local calendar date.
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn evaluation_date(&self) -> NaiveDate {
        self.today
    }

    /// Structural parse. Invalid or missing dates come back as `date: None`.
    pub fn parse(&self, raw: impl AsRef<Path>) -> ArtifactPath {
        let parts = split(raw.as_ref());
        ArtifactPath {
            date: parts.segment.as_deref().and_then(parse_date),
            raw: parts.raw,
            root: parts.root,
            slug: parts.slug,
            kind: parts.kind,
        }
    }

    /// Parse and check eligibility.
    ///
    /// Only Markdown posts and generated XML are candidates; both need a valid
    /// calendar date that is not after today, and a non-empty slug.
    pub fn classify(&self, raw: impl AsRef<Path>) -> Result<ArtifactPath, Ineligible> {
        let parts = split(raw.as_ref());
        match parts.kind {
            ArtifactKind::Markdown | ArtifactKind::GeneratedXml => {}
            other => return Err(Ineligible::UnsupportedKind(other)),
        }

        let segment = parts.segment.ok_or(Ineligible::MissingDate)?;
        let date = parse_date(&segment).ok_or(Ineligible::InvalidDate(segment))?;
        if date > self.today {
            return Err(Ineligible::FutureDate(date));
        }
        if parts.slug.is_empty() {
            return Err(Ineligible::MissingSlug);
        }

        Ok(ArtifactPath {
            raw: parts.raw,
            root: parts.root,
            date: Some(date),
            slug: parts.slug,
            kind: parts.kind,
        })
    }
}

struct Parts {
    raw: PathBuf,
    root: PathBuf,
    segment: Option<String>,
    slug: String,
    kind: ArtifactKind,
}

fn split(path: &Path) -> Parts {
    let kind = ArtifactKind::of_path(path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    if let Some(caps) = DATED_STEM.captures(&stem) {
        return Parts {
            raw: path.to_path_buf(),
            root: parent.to_path_buf(),
            segment: Some(caps[1].to_string()),
            slug: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            kind,
        };
    }

    // Date as the parent (`<date>/<slug>.xml`) or grandparent
    // (`<date>/<slug>/<slug>.xml`) directory.
    for dir in parent.ancestors().take(2) {
        let Some(name) = dir.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        if DATE_DIR.is_match(&name) {
            return Parts {
                raw: path.to_path_buf(),
                root: dir.parent().unwrap_or_else(|| Path::new("")).to_path_buf(),
                segment: Some(name.into_owned()),
                slug: stem,
                kind,
            };
        }
    }

    Parts {
        raw: path.to_path_buf(),
        root: parent.to_path_buf(),
        segment: None,
        slug: stem,
        kind,
    }
}

fn parse_date(segment: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(segment, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
