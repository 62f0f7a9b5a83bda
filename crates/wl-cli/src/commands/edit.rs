//! Commands that edit the tail of the work log in place.

use std::io::Write;

use anyhow::Result;
use wl_core::IssueKey;

use super::Workspace;

pub fn stop<W: Write>(writer: &mut W, workspace: &Workspace, time: Option<&str>) -> Result<()> {
    let mut editor = workspace.editor()?;
    let outcome = editor.stop(time, 0)?;
    workspace.finish(writer, &editor, &[outcome])
}

/// Runs `time` (and `edit`, which is `time` without flags).
pub fn time<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    time: Option<&str>,
    insert_break: bool,
    edit_start: bool,
) -> Result<()> {
    let mut editor = workspace.editor()?;
    let outcome = editor.edit_time(time, insert_break, edit_start)?;
    workspace.finish(writer, &editor, &[outcome])
}

pub fn delete<W: Write>(writer: &mut W, workspace: &Workspace) -> Result<()> {
    let mut editor = workspace.editor()?;
    let outcome = editor.delete()?;
    workspace.finish(writer, &editor, &[outcome])
}

pub fn comment<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    comment: &[String],
    append: bool,
) -> Result<()> {
    let text = comment.join(" ");
    let mut editor = workspace.editor()?;
    let outcome = editor.comment(append, Some(text.as_str()))?;
    workspace.finish(writer, &editor, &[outcome])
}

/// Runs `issue ISSUE [COMMENT...]`.
pub fn issue<W: Write>(writer: &mut W, workspace: &Workspace, args: &[String]) -> Result<()> {
    let issue = args.first().map(|input| {
        IssueKey::find_in(input).map_or_else(|| input.clone(), |key| key.as_str().to_string())
    });
    let comment = args.get(1..).unwrap_or_default().join(" ");
    let comment = Some(comment.as_str()).filter(|c| !c.trim().is_empty());

    let mut editor = workspace.editor()?;
    let outcome = editor.change_issue(issue.as_deref(), comment)?;
    workspace.finish(writer, &editor, &[outcome])
}
