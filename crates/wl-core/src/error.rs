//! Errors that make a document unusable.

use chrono::NaiveDateTime;
use thiserror::Error;

/// A structural problem in the document. Fatal: the file is not written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A time line followed by something other than `<minutes>m ...`.
    #[error("unexpected sequence {sequence} at line {line}")]
    UnexpectedSequence { sequence: String, line: usize },

    /// A time line with an impossible clock.
    #[error("invalid time {clock} at line {line}")]
    InvalidClock { clock: String, line: usize },

    /// A quick entry whose minute count does not fit a timestamp.
    #[error("invalid duration at line {line}")]
    InvalidDuration { line: usize },

    /// A time, issue or pause before the first day header.
    #[error("no day for time/issue at line {line}")]
    NoDay { line: usize },

    /// An issue that no boundary time opens.
    #[error("could not find start time of {input}")]
    MissingStart { input: String },

    /// A quick entry that starts before the entry preceding it has ended.
    #[error("overlapping entries at {start}")]
    OverlappingEntry { start: NaiveDateTime },
}
