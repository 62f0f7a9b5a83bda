//! `start` and `log` commands: begin work, or switch from the running log.

use std::io::Write;

use anyhow::Result;
use wl_core::grammar::parse_clock;
use wl_core::{Editor, IssueKey, StartRequest, parse_duration};

use super::Workspace;

/// Normalized arguments of a switch to another issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    pub time: Option<String>,
    /// Closes the new log after this many minutes.
    pub minutes: i64,
    pub issue: Option<String>,
    pub comment: Option<String>,
}

impl LogArgs {
    /// Splits `[TIME] [DURATION...] [ISSUE] [COMMENT...]`.
    ///
    /// Arguments are joined and re-split on whitespace first, so quoted and
    /// unquoted forms behave the same.
    pub fn parse(args: &[String]) -> Self {
        let joined = args.join(" ");
        let mut tokens = joined.split_whitespace().peekable();
        let mut parsed = Self::default();

        if let Some(token) = tokens.next_if(|token| parse_clock(token).is_some()) {
            parsed.time = Some(token.to_string());
        }
        while let Some(minutes) = tokens
            .peek()
            .and_then(|token| parse_duration(token, false))
            .filter(|minutes| *minutes > 0)
        {
            parsed.minutes = parsed.minutes.saturating_add(minutes);
            tokens.next();
        }
        parsed.issue = tokens.next().map(issue_input);
        parsed.comment = non_empty(tokens.collect::<Vec<_>>().join(" "));
        parsed
    }

    fn request(&self) -> StartRequest {
        StartRequest {
            issue: self.issue.clone(),
            comment: self.comment.clone(),
            time: self.time.clone(),
            duration: self.minutes,
        }
    }
}

/// Runs `start`.
///
/// A complete quick entry such as `09:00 5m TEST-1 foo` is appended to today
/// verbatim.
pub fn start<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    issue: Option<&str>,
    comment: &[String],
    time: Option<&str>,
    continue_last: bool,
) -> Result<()> {
    let mut editor = workspace.editor()?;

    if let Some(issue) = issue {
        let line = std::iter::once(issue)
            .chain(comment.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(outcome) = editor.log_quick_entry(&line) {
            return workspace.finish(writer, &editor, &[outcome]);
        }
    }

    let args = LogArgs {
        time: time.map(str::to_string),
        minutes: 0,
        issue: issue.map(issue_input),
        comment: non_empty(comment.join(" ")),
    };
    switch(writer, workspace, editor, args, continue_last)
}

/// Runs `log`.
pub fn log<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    args: &[String],
    continue_last: bool,
) -> Result<()> {
    let editor = workspace.editor()?;
    switch(writer, workspace, editor, LogArgs::parse(args), continue_last)
}

/// Stops the running log unless it already is the requested issue, then
/// starts the requested issue.
fn switch<W: Write>(
    writer: &mut W,
    workspace: &Workspace,
    mut editor: Editor,
    mut args: LogArgs,
    continue_last: bool,
) -> Result<()> {
    if continue_last {
        args.time = editor
            .last_time()
            .map(|time| time.format("%H:%M").to_string());
    }

    let mut outcomes = Vec::new();
    if let Some(running) = editor.running()? {
        let current = running
            .issues
            .first()
            .and_then(|&id| editor.document().issue(id))
            .map(|issue| issue.alias().to_string());

        match (args.issue.as_deref(), current) {
            (Some(issue), Some(alias)) if issue == alias => match args.comment.as_deref() {
                Some(comment) => outcomes.push(editor.comment(false, Some(comment))?),
                None => writeln!(
                    writer,
                    "Running since {}",
                    running.start.format("%H:%M")
                )?,
            },
            _ => {
                outcomes.push(editor.stop(args.time.as_deref(), args.minutes)?);
                if args.issue.is_some() {
                    outcomes.push(editor.start(&args.request())?);
                }
            }
        }
    } else {
        outcomes.push(editor.start(&args.request())?);
    }

    workspace.finish(writer, &editor, &outcomes)
}

/// Extracts the issue key from a branch name or URL, keeping aliases as is.
fn issue_input(input: &str) -> String {
    IssueKey::find_in(input).map_or_else(|| input.to_string(), |key| key.as_str().to_string())
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}
