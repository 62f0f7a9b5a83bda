//! `list` and `current` commands.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use wl_core::{ChargeItem, IssueKey, aggregate_all, aggregate_uncommitted, chargeable_items};

use super::Workspace;
use super::jira::Jira;
use crate::render::{self, Row};
use crate::summaries::SummaryCache;

/// Listing flags after conflict resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// One record per day and issue, committed work included.
    pub all: bool,
    /// One record per day and issue with uncommitted work.
    pub combine: bool,
    pub breaks: bool,
    pub summaries: bool,
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, workspace: &Workspace, options: &ListOptions) -> Result<()> {
    let items = load_items(workspace)?;

    if options.all || options.combine {
        let totals = if options.all {
            aggregate_all(&items)
        } else {
            aggregate_uncommitted(&items)
        };
        if options.json {
            writeln!(writer, "{}", serde_json::to_string_pretty(&totals)?)?;
            return Ok(());
        }
        let rows: Vec<Row> = totals.iter().map(Row::from).collect();
        return write_rows(writer, workspace, &rows, false, options.summaries);
    }

    if options.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&items)?)?;
        return Ok(());
    }
    let rows: Vec<Row> = items.iter().map(Row::from).collect();
    write_rows(writer, workspace, &rows, options.breaks, options.summaries)
}

/// Shows the last slice of the log.
pub fn current<W: Write>(writer: &mut W, workspace: &Workspace) -> Result<()> {
    let items = load_items(workspace)?;
    match items.last() {
        Some(item) => writeln!(writer, "{}", render::render_row(&Row::from(item), None))?,
        None => writeln!(writer, "No logs")?,
    }
    Ok(())
}

fn load_items(workspace: &Workspace) -> Result<Vec<ChargeItem>> {
    let mut editor = workspace.editor()?;
    let logs = editor.logs()?;
    let items = chargeable_items(editor.document(), &logs, false)?;
    tracing::debug!(logs = logs.len(), items = items.len(), "listing");
    Ok(items)
}

fn write_rows<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    rows: &[Row],
    breaks: bool,
    with_summaries: bool,
) -> Result<()> {
    let summaries = if with_summaries {
        summaries(workspace, rows)?
    } else {
        HashMap::new()
    };
    let text = render::render(rows, breaks, &summaries);
    if !text.is_empty() {
        writeln!(writer, "{text}")?;
    }
    Ok(())
}

/// Summaries of the listed issues, fetching uncached ones in one batch.
///
/// A failed fetch is logged and the listing goes on without the missing
/// summaries.
fn summaries(workspace: &Workspace, rows: &[Row]) -> Result<HashMap<String, String>> {
    let mut keys: Vec<String> = Vec::new();
    for issue in rows.iter().filter_map(|row| row.issue.as_deref()) {
        if IssueKey::new(issue).is_ok() && !keys.iter().any(|key| key == issue) {
            keys.push(issue.to_string());
        }
    }

    let mut cache = SummaryCache::load(&workspace.config.cache_path)?;
    let missing: Vec<String> = keys
        .iter()
        .filter(|key| cache.get(key).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        let mut jira = Jira::from_config(&workspace.config)?;
        if let Err(err) = cache.update(&missing, &mut jira) {
            tracing::warn!(error = %format!("{err:#}"), "could not fetch issue summaries");
        }
    }

    Ok(keys
        .into_iter()
        .filter_map(|key| cache.display(&key).map(|summary| (key, summary)))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::commands::testing::workspace;

    const TEXT: &str = "TEST-3 as Lunch\n25.11.2022\n\n09:00\nTEST-1 review\n10:00\n\n10:30\nTEST-2 docs x\n11:00\n";

    fn setup(text: &str) -> (tempfile::TempDir, PathBuf, Workspace) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("worklog.txt");
        fs::write(&path, text).unwrap();
        let ws = workspace(&path, 12, 0);
        (temp, path, ws)
    }

    fn list(ws: &Workspace, options: &ListOptions) -> String {
        let mut out = Vec::new();
        run(&mut out, ws, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ========== List Tests ==========

    #[test]
    fn plain_listing_shows_slices_and_breaks() {
        let (_temp, _path, ws) = setup(TEXT);
        let out = list(
            &ws,
            &ListOptions {
                breaks: true,
                ..ListOptions::default()
            },
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains(" 25.11.22 "));
        assert_eq!(lines[1], "* 09:00-10:00 TEST-1     1h      review");
        assert_eq!(lines[2], "  10:00-10:30 (break)    30m");
        assert_eq!(lines[3], "  10:30-11:00 TEST-2     30m     docs");
        assert!(lines[4].contains(" 1h 30m "));
    }

    #[test]
    fn combined_listing_skips_committed_work() {
        let (_temp, _path, ws) = setup(TEXT);
        let out = list(
            &ws,
            &ListOptions {
                combine: true,
                ..ListOptions::default()
            },
        );
        assert!(out.contains("* TEST-1     1h      review"));
        assert!(!out.contains("TEST-2"));
    }

    #[test]
    fn json_listing() {
        let (_temp, _path, ws) = setup(TEXT);
        let out = list(
            &ws,
            &ListOptions {
                all: true,
                json: true,
                ..ListOptions::default()
            },
        );
        let totals: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(totals.as_array().unwrap().len(), 2);
        assert_eq!(totals[0]["issue"], "TEST-1");
        assert_eq!(totals[0]["minutes"], 60);
        assert_eq!(totals[1]["issue"], "TEST-2");
        assert_eq!(totals[1]["minutes"], 0);
        assert_eq!(totals[1]["total"], 30);
    }

    #[test]
    fn summaries_come_from_the_cache() {
        let (_temp, _path, ws) = setup(TEXT);
        fs::write(
            &ws.config.cache_path,
            r#"{"TEST-1": {"summary": "Login page"}, "TEST-2": {"error": "Gone"}}"#,
        )
        .unwrap();

        let out = list(
            &ws,
            &ListOptions {
                breaks: true,
                summaries: true,
                ..ListOptions::default()
            },
        );
        assert!(out.contains("TEST-1     1h      [Login page] review"));
        assert!(out.contains("TEST-2     30m     [ERROR: Gone] docs"));
    }

    #[test]
    fn summaries_need_jira_for_uncached_issues() {
        let (_temp, _path, ws) = setup(TEXT);
        let mut out = Vec::new();
        let options = ListOptions {
            summaries: true,
            ..ListOptions::default()
        };
        assert!(run(&mut out, &ws, &options).is_err());
    }

    #[test]
    fn empty_log_lists_nothing() {
        let (_temp, _path, ws) = setup("");
        assert_eq!(list(&ws, &ListOptions::default()), "");
    }

    // ========== Current Tests ==========

    #[test]
    fn current_shows_running_slice() {
        let (_temp, _path, ws) = setup("25.11.2022\n\n11:00\nTEST-1 review\n");
        let mut out = Vec::new();
        current(&mut out, &ws).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "* 11:00-12:00 TEST-1     1h      review\n"
        );
    }

    #[test]
    fn current_without_logs() {
        let (_temp, _path, ws) = setup("");
        let mut out = Vec::new();
        current(&mut out, &ws).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No logs\n");
    }
}
