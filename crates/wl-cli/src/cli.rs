//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

/// Plain-text work log.
///
/// Tracks work in a human-editable text file grouped by day and commits
/// the logged time to Jira.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the work log file.
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Pretend the current time is this (`YYYY-MM-DD HH:MM`).
    #[arg(long, global = true, hide = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a log, or stop the running one and switch to another issue.
    ///
    /// A full quick entry such as `09:00 5m TEST-1 foo` is appended to today
    /// as is.
    Start {
        /// Issue key, alias, branch name or issue URL.
        issue: Option<String>,

        /// Comment.
        comment: Vec<String>,

        /// Alternative start time.
        #[arg(short, long, allow_hyphen_values = true)]
        time: Option<String>,

        /// Use the last time in the log as start time.
        #[arg(short = 'C', long = "continue")]
        continue_last: bool,
    },

    /// Add a log: `[TIME] [DURATION...] [ISSUE] [COMMENT...]`.
    ///
    /// With a duration the log is closed right away; without an issue the
    /// running log is stopped.
    Log {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Use the last time in the log as start time.
        #[arg(short = 'C', long = "continue")]
        continue_last: bool,
    },

    /// Stop the running log.
    Stop {
        /// Alternative end time.
        #[arg(short, long, allow_hyphen_values = true)]
        time: Option<String>,
    },

    /// Edit the last time.
    Edit {
        /// Time expression.
        #[arg(allow_hyphen_values = true)]
        time: Option<String>,
    },

    /// Edit the last time or the start of the current log.
    ///
    /// Formats: `HH:MM` sets the time, `MM` sets minutes in the hour,
    /// `+N` adds and `_N` subtracts minutes, `~` rounds.
    Time {
        /// Time expression.
        #[arg(allow_hyphen_values = true)]
        time: Option<String>,

        /// Keep the last time and insert a new one after it, leaving a break.
        #[arg(short, long = "break")]
        insert_break: bool,

        /// Edit the start time of the current log.
        #[arg(short, long)]
        start: bool,
    },

    /// Delete the last entry.
    Delete,

    /// Change the comment of the current log.
    Comment {
        comment: Vec<String>,

        /// Append to the existing comment.
        #[arg(short, long)]
        append: bool,
    },

    /// Change the issue of the current log.
    Issue {
        /// Issue followed by an optional new comment.
        args: Vec<String>,
    },

    /// List logs.
    List {
        /// List all logs, including committed ones.
        #[arg(short, long, conflicts_with = "breaks")]
        all: bool,

        /// Combine logs with the same issue per day.
        #[arg(long, conflicts_with = "breaks")]
        combine: bool,

        /// Hide breaks.
        #[arg(long = "no-breaks", conflicts_with = "breaks")]
        no_breaks: bool,

        /// Show breaks (default for the plain listing).
        #[arg(short, long)]
        breaks: bool,

        /// Show issue summaries from Jira.
        #[arg(short, long)]
        summaries: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Commit uncommitted logs to Jira.
    Commit {
        /// Skip the preview and commit right away.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the current log.
    Current,

    /// Clear the issue summary cache.
    ClearCache,
}

fn parse_now(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map_err(|err| format!("expected YYYY-MM-DD HH:MM: {err}"))
}
