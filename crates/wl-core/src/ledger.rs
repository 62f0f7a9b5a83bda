//! Submitting aggregated work to an external ledger.

use std::fmt;

use chrono::NaiveDateTime;

use crate::aggregate::IssueTotal;
use crate::timeexpr::format_minutes;
use crate::tree::Document;
use crate::types::IssueKey;

/// Destination of worklog records, e.g. an issue tracker.
pub trait Ledger {
    type Error: fmt::Display;

    /// Records `minutes` of work on `issue` starting at `started`.
    fn submit(
        &mut self,
        issue: &IssueKey,
        comment: &str,
        started: NaiveDateTime,
        minutes: i64,
    ) -> Result<(), Self::Error>;
}

/// Why a record was not submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Still running.
    Running,
    /// Nothing uncommitted.
    NoMinutes,
    /// Worklogs need a comment.
    NoComment,
    /// Not a valid issue key (an unresolved alias, for instance).
    InvalidKey,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "still running",
            Self::NoMinutes => "nothing to log",
            Self::NoComment => "no comment",
            Self::InvalidKey => "not an issue key",
        })
    }
}

/// Result of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    Skipped(SkipReason),
    Failed(String),
}

/// One record pushed (or not) through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub issue: String,
    pub minutes: i64,
    pub comment: String,
    pub outcome: SubmissionOutcome,
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {} {} {}",
            format_minutes(self.minutes),
            self.issue,
            self.comment
        )?;
        match &self.outcome {
            SubmissionOutcome::Submitted => f.write_str(" ✓"),
            SubmissionOutcome::Skipped(reason) => write!(f, " (skipped: {reason})"),
            SubmissionOutcome::Failed(message) => write!(f, " ✗ {message}"),
        }
    }
}

/// Pushes every record through `ledger`, one at a time.
///
/// Issues of successful records are marked done in `document`. A failing
/// record does not stop the remaining ones.
pub fn submit_all<L: Ledger>(
    document: &mut Document,
    totals: &[IssueTotal],
    ledger: &mut L,
) -> Vec<Submission> {
    totals
        .iter()
        .map(|total| {
            let outcome = submit_one(document, total, ledger);
            Submission {
                issue: total.issue.clone(),
                minutes: total.minutes,
                comment: total.comment.clone(),
                outcome,
            }
        })
        .collect()
}

fn submit_one<L: Ledger>(
    document: &mut Document,
    total: &IssueTotal,
    ledger: &mut L,
) -> SubmissionOutcome {
    if total.transient {
        return SubmissionOutcome::Skipped(SkipReason::Running);
    }
    if total.minutes <= 0 {
        return SubmissionOutcome::Skipped(SkipReason::NoMinutes);
    }
    if total.comment.is_empty() {
        return SubmissionOutcome::Skipped(SkipReason::NoComment);
    }
    let Ok(key) = IssueKey::new(total.issue.as_str()) else {
        return SubmissionOutcome::Skipped(SkipReason::InvalidKey);
    };

    match ledger.submit(&key, &total.comment, total.start, total.minutes) {
        Ok(()) => {
            for &id in &total.issues {
                if let Some(issue) = document.issue_mut(id) {
                    issue.is_done = true;
                }
            }
            tracing::debug!(issue = %key, minutes = total.minutes, "submitted worklog");
            SubmissionOutcome::Submitted
        }
        Err(err) => {
            tracing::warn!(issue = %key, error = %err, "worklog submission failed");
            SubmissionOutcome::Failed(err.to_string())
        }
    }
}
