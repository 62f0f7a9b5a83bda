//! In-place edits of a work log document.
//!
//! Every operation either changes the tree and reports what it did
//! ([`Outcome::Applied`]) or leaves it untouched with a [`Warning`]. Callers
//! write the document back only for applied edits.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::config::DocumentConfig;
use crate::error::SyntaxError;
use crate::grammar::{self, Line};
use crate::interpreter::{self, Log};
use crate::parser::entry_node;
use crate::serializer;
use crate::timeexpr::{self, TimeError};
use crate::tree::{Day, Document, Issue, Minutes, NodeId, NodeKind, Time};

const CLOCK_FORMAT: &str = "%H:%M";

/// Errors that abort an edit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Reasons an edit was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    NoActiveLog,
    NoTimeFound,
    NoStartTimeFound,
    NoIssueFound,
    NothingToDelete,
    IssueUnchanged { issue: String },
    NoIssueGiven,
    NoCommentGiven,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveLog => f.write_str("No active log"),
            Self::NoTimeFound => f.write_str("No time found"),
            Self::NoStartTimeFound => f.write_str("No start time found"),
            Self::NoIssueFound => f.write_str("No issue found"),
            Self::NothingToDelete => f.write_str("Nothing to delete"),
            Self::IssueUnchanged { issue } => write!(f, "Issue is already '{issue}'"),
            Self::NoIssueGiven => f.write_str("No issue given"),
            Self::NoCommentGiven => f.write_str("No comment given"),
        }
    }
}

/// Result of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document changed; the message describes how.
    Applied(String),
    /// Nothing changed.
    Skipped(Warning),
}

impl Outcome {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Parameters of [`Editor::start`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartRequest {
    /// Issue key or alias.
    pub issue: Option<String>,
    pub comment: Option<String>,
    /// Time expression for the start; defaults to rounded now.
    pub time: Option<String>,
    /// Without `time`: start this many minutes before now. Positive values
    /// also close the new interval after that many minutes.
    pub duration: i64,
}

/// Applies edits to a document as of a fixed `now`.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    config: DocumentConfig,
    now: NaiveDateTime,
}

impl Editor {
    pub const fn new(document: Document, config: DocumentConfig, now: NaiveDateTime) -> Self {
        Self {
            document,
            config,
            now,
        }
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Current text of the document.
    pub fn render(&self) -> String {
        serializer::render(&self.document)
    }

    /// Interprets the document as of `now`.
    pub fn logs(&mut self) -> Result<Vec<Log>, SyntaxError> {
        interpreter::interpret(&mut self.document, &self.config, self.now)
    }

    /// The running log, if any.
    pub fn running(&mut self) -> Result<Option<Log>, SyntaxError> {
        Ok(interpreter::running(&self.logs()?).cloned())
    }

    /// Clock of the last time in the document.
    pub fn last_time(&self) -> Option<NaiveTime> {
        let id = self
            .document
            .find_last(self.document.root(), 0, |k| matches!(k, NodeKind::Time(_)))?;
        self.document.time(id).map(|t| t.clock)
    }

    fn rounded_now(&self) -> NaiveDateTime {
        timeexpr::round(self.now, self.config.round_minutes)
    }

    fn resolve_time(
        &self,
        expr: Option<&str>,
        minutes_ago: i64,
    ) -> Result<NaiveDateTime, TimeError> {
        match expr {
            Some(expr) => timeexpr::parse_time(expr, self.now, self.config.round_minutes),
            None => minutes_ago
                .checked_neg()
                .and_then(|minutes| timeexpr::shift(self.rounded_now(), minutes))
                .ok_or_else(|| TimeError::InvalidTime {
                    input: format!("{minutes_ago}m"),
                }),
        }
    }

    /// Starts work on an issue. Without an issue the last one continues.
    pub fn start(&mut self, request: &StartRequest) -> Result<Outcome, EditError> {
        self.logs()?;
        let wanted = request.issue.as_deref().map(str::trim).filter(|i| !i.is_empty());
        let previous = self.document.find_last(self.document.root(), 0, |k| {
            matches!(k, NodeKind::Issue(i)
                if wanted.is_none_or(|w| i.key() == w || i.alias() == w))
        });
        let previous = previous.and_then(|id| self.document.issue(id));
        let comment = request.comment.as_deref().unwrap_or_default().trim();
        let input = match (previous, wanted, comment.is_empty()) {
            (Some(prev), _, true) => prev.input.clone(),
            (Some(prev), _, false) => format!("{} {comment}", prev.alias()),
            (None, Some(issue), true) => issue.to_string(),
            (None, Some(issue), false) => format!("{issue} {comment}"),
            (None, None, _) => return Ok(Outcome::Skipped(Warning::NoIssueGiven)),
        };
        let started = self.resolve_time(request.time.as_deref(), request.duration)?;
        let ended = match request.duration {
            ..=0 => None,
            minutes => Some(timeexpr::shift(started, minutes).ok_or_else(|| {
                TimeError::InvalidTime {
                    input: format!("{minutes}m"),
                }
            })?),
        };

        let day = self.find_or_create_day(started.date());
        let time = self.boundary_at(day, started.time());
        let issue_node = self
            .document
            .insert_after(time, NodeKind::Issue(Issue::new(input.as_str(), false)));

        if let Some(ended) = ended {
            let end_time = time_node(ended.time());
            if ended.date() == started.date() {
                self.document.insert_after(issue_node, end_time);
            } else {
                let landing = self.find_or_create_day(ended.date());
                self.document.insert_at(landing, 0, end_time);
            }
        }

        tracing::debug!(%input, start = %started, "started issue");
        Ok(Outcome::Applied(format!(
            "Started {input} at {}",
            started.format(CLOCK_FORMAT)
        )))
    }

    /// Closes the running log.
    pub fn stop(&mut self, time: Option<&str>, minutes_ago: i64) -> Result<Outcome, EditError> {
        let Some(running) = self.running()? else {
            return Ok(Outcome::Skipped(Warning::NoActiveLog));
        };
        let Some(&issue) = running.issues.last() else {
            return Ok(Outcome::Skipped(Warning::NoActiveLog));
        };
        let stopped = self.resolve_time(time, minutes_ago)?;

        let mut anchor = issue;
        while let Some(next) = self.document.sibling(anchor, 1) {
            if matches!(self.document.kind(next), NodeKind::EmptyLine) {
                break;
            }
            anchor = next;
        }
        self.document
            .insert_after(anchor, time_node(stopped.time()));

        let input = self
            .document
            .issue(issue)
            .map(|i| i.input.clone())
            .unwrap_or_default();
        Ok(Outcome::Applied(format!(
            "Stopped {input} at {}",
            stopped.format(CLOCK_FORMAT)
        )))
    }

    /// Changes the last time, or the start of the last issue.
    ///
    /// With `insert_break`, the edited time is kept and a new boundary is
    /// added after it instead. A missing expression means rounded now.
    pub fn edit_time(
        &mut self,
        time: Option<&str>,
        insert_break: bool,
        edit_start: bool,
    ) -> Result<Outcome, EditError> {
        let root = self.document.root();
        let Some(last_time) = self
            .document
            .find_last(root, 0, |k| matches!(k, NodeKind::Time(_)))
        else {
            return Ok(Outcome::Skipped(Warning::NoTimeFound));
        };

        let (target, insert_break) = if edit_start {
            let Some(start) = self.start_of_last_issue() else {
                return Ok(Outcome::Skipped(Warning::NoStartTimeFound));
            };
            (start, insert_break)
        } else {
            let last_is_time = self.last_content().is_some_and(|id| self.document.time(id).is_some());
            (last_time, insert_break && !last_is_time)
        };

        let Some(day) = self.document.enclosing_day(target) else {
            return Ok(Outcome::Skipped(Warning::NoTimeFound));
        };
        let Some(clock) = self.document.time(target).map(|t| t.clock) else {
            return Ok(Outcome::Skipped(Warning::NoTimeFound));
        };
        let date = self.day_date(day).unwrap_or_else(|| self.now.date());
        let reference = interpreter::timestamp(&self.document, &self.config, target)
            .unwrap_or_else(|| date.and_time(clock));
        let edited = match time {
            Some(expr) => timeexpr::parse_time(expr, reference, self.config.round_minutes)?,
            None => self.rounded_now(),
        };

        if insert_break {
            let blank = self.document.insert_after(target, NodeKind::EmptyLine);
            self.document.insert_after(blank, time_node(edited.time()));
        } else {
            if let Some(t) = self.document.time_mut(target) {
                t.clock = edited.time();
            }
            // Dates between the day and the rolled-over date stay in the day.
            let landing = edited.date();
            if landing < date || landing > reference.date() {
                self.relocate(target, date, landing);
            }
        }

        Ok(Outcome::Applied(format!(
            "Set time to {}",
            edited.format(CLOCK_FORMAT)
        )))
    }

    /// Moves a time whose date changed into the matching day.
    fn relocate(&mut self, node: NodeId, from: NaiveDate, to: NaiveDate) {
        if from == to {
            return;
        }
        let day = self.find_or_create_day(to);
        if to > from {
            self.document.move_to(node, day, 0);
        } else {
            let end = self.document.children(day).len();
            self.document.move_to(node, day, end);
        }
        tracing::debug!(%from, %to, "moved time to another day");
    }

    /// Removes the last entry.
    pub fn delete(&mut self) -> Result<Outcome, EditError> {
        self.logs()?;
        let Some(last) = self.last_content() else {
            return Ok(Outcome::Skipped(Warning::NothingToDelete));
        };
        let target = self.document.quick_entry_owner(last).unwrap_or(last);

        match self.document.kind(target) {
            NodeKind::Time(_) | NodeKind::Alias(_) | NodeKind::Minutes(_) => {
                let line = self.line_of(target);
                self.document.detach(target);
                Ok(Outcome::Applied(format!("Deleted {line}")))
            }
            NodeKind::Issue(_) | NodeKind::Pause(_) => Ok(self.delete_entry(target)),
            NodeKind::Root | NodeKind::EmptyLine | NodeKind::Day(_) => {
                Ok(Outcome::Skipped(Warning::NothingToDelete))
            }
        }
    }

    fn delete_entry(&mut self, entry: NodeId) -> Outcome {
        let mut doomed = vec![entry];
        let mut start = "--:--".to_string();

        if let Some(prev) = self.document.sibling(entry, -1) {
            match self.document.kind(prev) {
                NodeKind::EmptyLine => doomed.push(prev),
                NodeKind::Time(t) if self.document.is_boundary(prev) => {
                    start = t.clock.format(CLOCK_FORMAT).to_string();
                    if let Some(blank) = self.document.sibling(prev, -1) {
                        if matches!(self.document.kind(blank), NodeKind::EmptyLine) {
                            doomed.push(prev);
                            doomed.push(blank);
                        }
                    }
                }
                _ => {}
            }
        }
        let input = self.line_of(entry);
        for id in doomed {
            self.document.detach(id);
        }
        Outcome::Applied(format!("Deleted {start} - --:--  {input}"))
    }

    /// Replaces issue and optionally comment of the last issue.
    pub fn change_issue(
        &mut self,
        issue: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Outcome, EditError> {
        let Some(issue) = issue.map(str::trim).filter(|i| !i.is_empty()) else {
            return Ok(Outcome::Skipped(Warning::NoIssueGiven));
        };
        self.logs()?;
        let Some(last) = self.last_issue() else {
            return Ok(Outcome::Skipped(Warning::NoIssueFound));
        };
        let Some(node) = self.document.issue_mut(last) else {
            return Ok(Outcome::Skipped(Warning::NoIssueFound));
        };

        let from = format!("{} {}", node.alias(), node.comment()).trim().to_string();
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| node.comment());
        let to = format!("{issue} {comment}").trim().to_string();
        if from == to {
            return Ok(Outcome::Skipped(Warning::IssueUnchanged { issue: from }));
        }
        node.input.clone_from(&to);
        node.resolved = None;

        Ok(Outcome::Applied(format!(
            "Changed issue from '{from}' to '{to}'"
        )))
    }

    /// Sets or extends the comment of the last issue.
    pub fn comment(&mut self, append: bool, text: Option<&str>) -> Result<Outcome, EditError> {
        self.logs()?;
        let Some(last) = self.last_issue() else {
            return Ok(Outcome::Skipped(Warning::NoIssueFound));
        };
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(Outcome::Skipped(Warning::NoCommentGiven));
        };
        let Some(node) = self.document.issue_mut(last) else {
            return Ok(Outcome::Skipped(Warning::NoIssueFound));
        };

        let from = node.comment().to_string();
        let existing = from.trim();
        let to = if append && !existing.is_empty() {
            format!("{existing}; {text}")
        } else {
            text.to_string()
        };
        node.input = format!("{} {to}", node.alias());
        node.resolved = None;

        Ok(Outcome::Applied(format!(
            "Changed comment from '{from}' to '{to}'"
        )))
    }

    /// Appends a standalone `HH:MM <n>m <entry>` line to today.
    ///
    /// Returns `None` when `line` is not such a line.
    pub fn log_quick_entry(&mut self, line: &str) -> Option<Outcome> {
        let Ok(Line::Time {
            clock,
            entry: Some(quick),
        }) = grammar::classify(line, &self.config)
        else {
            return None;
        };

        let today = self.find_or_create_day(self.rounded_now().date());
        let anchor = self.last_non_blank_child(today);
        let time = match anchor {
            Some(anchor) => self.document.insert_after(anchor, time_node(clock)),
            None => self.document.append(today, time_node(clock)),
        };
        let minutes = self.document.append(
            time,
            NodeKind::Minutes(Minutes {
                minutes: quick.minutes,
            }),
        );
        self.document.append(minutes, entry_node(quick.entry));

        Some(Outcome::Applied(format!("Logged {}", self.line_of(time))))
    }

    /// The day node for `date`, appended (with a leading blank line) if missing.
    fn find_or_create_day(&mut self, date: NaiveDate) -> NodeId {
        let text = self.config.format_day(date);
        let existing = self
            .document
            .days()
            .into_iter()
            .find(|&id| self.document.day(id).is_some_and(|d| d.date == text));
        if let Some(day) = existing {
            return day;
        }
        let root = self.document.root();
        let day = self.document.append(
            root,
            NodeKind::Day(Day {
                date: text,
                decoration: self.config.day_decoration.clone(),
            }),
        );
        self.document.append(day, NodeKind::EmptyLine);
        day
    }

    /// The day's last boundary if it has `clock`, else a new boundary after
    /// the day's content, separated by a blank line.
    fn boundary_at(&mut self, day: NodeId, clock: NaiveTime) -> NodeId {
        let last = self
            .document
            .find_last(day, 0, |k| matches!(k, NodeKind::Time(_)));
        if let Some(last) = last {
            if self.document.is_boundary(last)
                && self.document.time(last).is_some_and(|t| t.clock == clock)
            {
                return last;
            }
        }

        match self.last_non_blank_child(day) {
            Some(anchor) => {
                let blank = self.document.insert_after(anchor, NodeKind::EmptyLine);
                self.document.insert_after(blank, time_node(clock))
            }
            None => {
                let time = self.document.append(day, time_node(clock));
                self.document.append(day, NodeKind::EmptyLine);
                time
            }
        }
    }

    fn last_non_blank_child(&self, day: NodeId) -> Option<NodeId> {
        self.document
            .children(day)
            .iter()
            .rev()
            .copied()
            .find(|&id| !matches!(self.document.kind(id), NodeKind::EmptyLine))
    }

    /// Last node that is neither blank nor a day header.
    fn last_content(&self) -> Option<NodeId> {
        self.document.find_last(self.document.root(), 0, |k| {
            !matches!(k, NodeKind::EmptyLine | NodeKind::Day(_))
        })
    }

    fn last_issue(&self) -> Option<NodeId> {
        self.document
            .find_last(self.document.root(), 0, |k| matches!(k, NodeKind::Issue(_)))
    }

    /// The boundary opening the last issue that is a direct day entry.
    fn start_of_last_issue(&self) -> Option<NodeId> {
        let root = self.document.root();
        let issue = self.document.descendants(root).into_iter().rev().find(|&id| {
            self.document.issue(id).is_some()
                && self
                    .document
                    .parent(id)
                    .is_some_and(|p| self.document.day(p).is_some())
        })?;
        let mut current = issue;
        while let Some(prev) = self.document.sibling(current, -1) {
            if self.document.is_boundary(prev) {
                return Some(prev);
            }
            current = prev;
        }
        None
    }

    fn day_date(&self, day: NodeId) -> Option<NaiveDate> {
        self.document
            .day(day)
            .and_then(|d| self.config.parse_day(&d.date))
    }

    /// The text line a node serializes to, without newline.
    fn line_of(&self, id: NodeId) -> String {
        let mut single = Document::new();
        let root = single.root();
        copy_subtree(&self.document, id, &mut single, root);
        serializer::serialize(&single).trim_end_matches('\n').to_string()
    }
}

fn time_node(clock: NaiveTime) -> NodeKind {
    NodeKind::Time(Time { clock })
}

fn copy_subtree(from: &Document, id: NodeId, to: &mut Document, parent: NodeId) {
    let copy = to.append(parent, from.kind(id).clone());
    for &child in from.children(id) {
        copy_subtree(from, child, to, copy);
    }
}
