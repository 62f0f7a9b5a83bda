//! `commit` command: submit uncommitted work to Jira.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use wl_core::{
    Editor, IssueTotal, Ledger, SubmissionOutcome, aggregate_uncommitted, chargeable_items,
    submit_all,
};

use super::Workspace;
use super::jira::Jira;
use crate::logfile;
use crate::render::{self, Row};

/// Previews the uncommitted records and, with `yes`, submits them.
pub fn run<W: Write>(writer: &mut W, workspace: &Workspace, yes: bool) -> Result<()> {
    let mut editor = workspace.editor()?;
    let logs = editor.logs()?;
    let items = chargeable_items(editor.document(), &logs, false)?;
    let totals = aggregate_uncommitted(&items);

    if totals.is_empty() {
        writeln!(writer, "Nothing to commit")?;
        return Ok(());
    }
    let rows: Vec<Row> = totals.iter().map(Row::from).collect();
    writeln!(writer, "{}", render::render(&rows, false, &HashMap::new()))?;

    if !yes {
        writeln!(writer, "Run `wl commit --yes` to commit to Jira")?;
        return Ok(());
    }
    let mut jira = Jira::from_config(&workspace.config)?;
    submit(writer, workspace, editor, &totals, &mut jira)
}

/// Pushes `totals` through `ledger` and saves the records marked done.
fn submit<W: Write, L: Ledger>(
    writer: &mut W,
    workspace: &Workspace,
    editor: Editor,
    totals: &[IssueTotal],
    ledger: &mut L,
) -> Result<()> {
    let mut document = editor.into_document();
    let submissions = submit_all(&mut document, totals, ledger);
    for submission in &submissions {
        writeln!(writer, "{submission}")?;
    }

    let submitted = submissions
        .iter()
        .filter(|submission| submission.outcome == SubmissionOutcome::Submitted)
        .count();
    tracing::debug!(submitted, total = submissions.len(), "commit finished");
    if submitted > 0 {
        logfile::save(&workspace.config.file, &document)?;
    }
    writeln!(writer, "All done!")?;
    Ok(())
}
