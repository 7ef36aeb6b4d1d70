//! `stagehand classify`: explain eligibility for a set of paths.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stagehand_core::PathClassifier;

use crate::CommandResult;

/// Arguments for `stagehand classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Paths to classify (source posts or generated XML).
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Evaluate publication dates against this day instead of the local date.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Classification {
    path: PathBuf,
    kind: String,
    date: Option<NaiveDate>,
    slug: String,
    eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    /// Relative to the destination root.
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<PathBuf>,
}

#[derive(Tabled)]
struct ClassifyRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "date")]
    date: String,
    #[tabled(rename = "slug")]
    slug: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "destination")]
    destination: String,
}

impl ClassifyArgs {
    pub fn run(self) -> CommandResult {
        let classifier = self
            .today
            .map(PathClassifier::new)
            .unwrap_or_else(PathClassifier::today);
        let rows: Vec<Classification> = self
            .paths
            .iter()
            .map(|p| classify(&classifier, p))
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize classification")?
            );
            return Ok(ExitCode::SUCCESS);
        }

        println!("Evaluated against {}", classifier.evaluation_date());
        let table_rows: Vec<ClassifyRow> = rows.into_iter().map(ClassifyRow::from).collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(ExitCode::SUCCESS)
    }
}

fn classify(classifier: &PathClassifier, path: &Path) -> Classification {
    let parsed = classifier.parse(path);
    let verdict = classifier.classify(path);
    Classification {
        path: path.to_path_buf(),
        kind: parsed.kind().to_string(),
        date: parsed.date(),
        slug: parsed.slug().to_string(),
        eligible: verdict.is_ok(),
        destination: verdict
            .as_ref()
            .ok()
            .and_then(|a| a.destination_in(Path::new(""))),
        reason: verdict.err().map(|e| e.to_string()),
    }
}

impl From<Classification> for ClassifyRow {
    fn from(c: Classification) -> Self {
        Self {
            path: c.path.display().to_string(),
            kind: c.kind,
            date: c.date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            slug: if c.slug.is_empty() { "-".into() } else { c.slug },
            status: match c.reason {
                Some(reason) => format!("skip: {reason}"),
                None => "eligible".into(),
            },
            destination: c
                .destination
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "-".into()),
        }
    }
}
