//! Parsing of `git diff --name-status` listings into [`VcsChange`] rows.
//!
//! ```text
//! A	_posts/2020-01-05-hello-world.markdown
//! M	_posts/2019-11-02-update.md
//! D	_posts/2018-03-09-gone.md
//! R087	_posts/2017-01-01-old.md	_posts/2017-01-01-new.md
//! ```
//!
//! Renames become a delete of the old path followed by an add of the new one;
//! copies become an add. Type changes (`T`) count as modifications.

use crate::error::ChangeListError;
use crate::types::{ChangeOperation, VcsChange};

/// Parse a full name-status listing. Blank lines are ignored.
pub fn parse_name_status(text: &str) -> Result<Vec<VcsChange>, ChangeListError> {
    let mut changes = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        changes.extend(parse_line(idx + 1, line)?);
    }
    Ok(changes)
}

fn parse_line(line_no: usize, line: &str) -> Result<Vec<VcsChange>, ChangeListError> {
    // git separates columns with tabs; fall back to whitespace for
    // hand-written listings.
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    };
    let status = fields[0].trim();
    let paths = &fields[1..];

    let need = |expected: usize| -> Result<(), ChangeListError> {
        if paths.len() < expected || paths[..expected].iter().any(|p| p.is_empty()) {
            return Err(ChangeListError::MissingPath {
                line: line_no,
                status: status.to_string(),
                expected,
            });
        }
        Ok(())
    };

    match status.chars().next() {
        Some('A') => {
            need(1)?;
            Ok(vec![VcsChange::added(paths[0])])
        }
        Some('M') | Some('T') => {
            need(1)?;
            Ok(vec![VcsChange::modified(paths[0])])
        }
        Some('D') => {
            need(1)?;
            Ok(vec![VcsChange::deleted(paths[0])])
        }
        Some('R') => {
            need(2)?;
            Ok(vec![VcsChange::deleted(paths[0]), VcsChange::added(paths[1])])
        }
        Some('C') => {
            need(2)?;
            Ok(vec![VcsChange {
                change_type: ChangeOperation::Add,
                old_path: Some(paths[0].to_string()),
                new_path: Some(paths[1].to_string()),
            }])
        }
        _ => Err(ChangeListError::UnknownStatus {
            line: line_no,
            status: status.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_statuses() {
        let text = "A\t_posts/2020-01-05-a.md\nM\t_posts/2020-01-06-b.md\nD\t_posts/2020-01-07-c.md\n";
        let changes = parse_name_status(text).expect("parse");
        assert_eq!(
            changes,
            vec![
                VcsChange::added("_posts/2020-01-05-a.md"),
                VcsChange::modified("_posts/2020-01-06-b.md"),
                VcsChange::deleted("_posts/2020-01-07-c.md"),
            ]
        );
    }

    #[test]
    fn rename_splits_into_delete_and_add() {
        let changes =
            parse_name_status("R100\t_posts/2020-01-05-old.md\t_posts/2020-01-05-new.md").unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_type, ChangeOperation::Delete);
        assert_eq!(changes[0].effective_path(), Some("_posts/2020-01-05-old.md"));
        assert_eq!(changes[1].change_type, ChangeOperation::Add);
        assert_eq!(changes[1].effective_path(), Some("_posts/2020-01-05-new.md"));
    }

    #[test]
    fn copy_is_add_of_new_path() {
        let changes = parse_name_status("C075\ta.md\tb.md").unwrap();
        assert_eq!(changes[0].effective_path(), Some("b.md"));
    }

    #[test]
    fn whitespace_separated_and_blank_lines_are_accepted() {
        let changes = parse_name_status("\nA  _posts/2020-01-05-a.md\r\n\n").unwrap();
        assert_eq!(changes, vec![VcsChange::added("_posts/2020-01-05-a.md")]);
    }

    #[test]
    fn unknown_status_reports_line() {
        let err = parse_name_status("A\tok.md\nX\twhat.md").unwrap_err();
        assert_eq!(
            err,
            ChangeListError::UnknownStatus {
                line: 2,
                status: "X".to_string()
            }
        );
    }

    #[test]
    fn rename_without_new_path_is_rejected() {
        let err = parse_name_status("R100\tonly-old.md").unwrap_err();
        assert!(matches!(err, ChangeListError::MissingPath { expected: 2, .. }));
    }
}
