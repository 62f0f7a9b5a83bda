//! Text to document tree.

use crate::config::DocumentConfig;
use crate::error::SyntaxError;
use crate::grammar::{self, Entry, Line, LineError};
use crate::tree::{Alias, Day, Document, Issue, Minutes, NodeId, NodeKind, Pause, Time};

/// Accumulator of the line fold: the document so far and the open day.
#[derive(Debug, Default)]
pub struct ParseState {
    document: Document,
    day: Option<NodeId>,
}

impl ParseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one line. `line_no` is 1-based and only used for errors.
    pub fn feed(
        mut self,
        line_no: usize,
        line: &str,
        config: &DocumentConfig,
    ) -> Result<Self, SyntaxError> {
        let root = self.document.root();
        let line = grammar::classify(line, config).map_err(|err| match err {
            LineError::UnexpectedSequence { sequence } => SyntaxError::UnexpectedSequence {
                sequence,
                line: line_no,
            },
            LineError::InvalidClock { clock } => SyntaxError::InvalidClock {
                clock,
                line: line_no,
            },
        })?;

        match line {
            Line::Empty => {
                self.document
                    .append(self.day.unwrap_or(root), NodeKind::EmptyLine);
            }
            Line::Alias { issue_key, name } => {
                self.document.append(
                    self.day.unwrap_or(root),
                    NodeKind::Alias(Alias {
                        issue_key: issue_key.to_string(),
                        name: name.to_string(),
                    }),
                );
            }
            Line::Day { date, decoration } => {
                let day = self.document.append(
                    root,
                    NodeKind::Day(Day {
                        date: date.to_string(),
                        decoration: decoration.to_string(),
                    }),
                );
                self.day = Some(day);
            }
            Line::Time { clock, entry } => {
                let day = self.day.ok_or(SyntaxError::NoDay { line: line_no })?;
                let time = self.document.append(day, NodeKind::Time(Time { clock }));
                if let Some(quick) = entry {
                    let minutes = self.document.append(
                        time,
                        NodeKind::Minutes(Minutes {
                            minutes: quick.minutes,
                        }),
                    );
                    self.document.append(minutes, entry_node(quick.entry));
                }
            }
            Line::Entry(entry) => {
                let day = self.day.ok_or(SyntaxError::NoDay { line: line_no })?;
                self.document.append(day, entry_node(entry));
            }
        }

        Ok(self)
    }

    pub fn finish(self) -> Document {
        self.document
    }
}

/// Node for an issue or pause line.
pub(crate) fn entry_node(entry: Entry<'_>) -> NodeKind {
    match entry {
        Entry::Issue { input, done } => NodeKind::Issue(Issue::new(input, done)),
        Entry::Pause { done } => NodeKind::Pause(Pause { is_done: done }),
    }
}

/// Parses a whole document. `\r\n` line endings are accepted.
pub fn parse(text: &str, config: &DocumentConfig) -> Result<Document, SyntaxError> {
    let text = text.replace("\r\n", "\n");
    let state = text
        .split('\n')
        .enumerate()
        .try_fold(ParseState::new(), |state, (idx, line)| {
            state.feed(idx + 1, line, config)
        })?;
    let document = state.finish();
    tracing::debug!(
        nodes = document.len(),
        days = document.days().len(),
        "parsed document"
    );
    Ok(document)
}
