//! Document tree to work intervals.
//!
//! The interpreter walks the children of every day in order and carries the
//! open interval across days:
//!
//! - a boundary time closes the open log (if any) and opens the next one,
//! - an issue joins the open log,
//! - a quick entry becomes a closed log of its own, nested in the open log
//!   when that log already has work attached.
//!
//! A log still open at the end with work attached is "running": it ends at
//! `now` and is marked transient. Every consumed issue gets its alias
//! resolution written back into the tree.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::DocumentConfig;
use crate::error::SyntaxError;
use crate::timeexpr;
use crate::tree::{Document, NodeId, NodeKind, Resolution};

/// A chronological work interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// Issue nodes worked on during the interval, in document order.
    pub issues: Vec<NodeId>,
    /// Quick entries inside the interval.
    pub children: Vec<Log>,
    /// Still running; `end` is the interpretation time.
    pub transient: bool,
}

impl Log {
    pub const fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: None,
            issues: Vec::new(),
            children: Vec::new(),
            transient: false,
        }
    }

    /// Wall clock minutes between start and end, rounded. An open log
    /// counts until the following midnight.
    pub fn duration_minutes(&self) -> i64 {
        let end = self.end.unwrap_or_else(|| {
            (self.start.date() + Duration::days(1)).and_time(NaiveTime::MIN)
        });
        let seconds = (end - self.start).num_seconds();
        (seconds + 30).div_euclid(60)
    }

    /// Minutes attributed to this log itself, excluding its children.
    pub fn minutes(&self) -> i64 {
        self.duration_minutes() - self.children.iter().map(Self::minutes).sum::<i64>()
    }
}

/// Alias declarations visible from one day: root level first, day level
/// overriding in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    /// `(alias name, issue key)` in declaration order.
    entries: Vec<(String, String)>,
}

impl AliasMap {
    /// Collects the aliases in scope for `day`.
    pub fn for_day(document: &Document, day: NodeId) -> Self {
        let mut map = Self::default();
        for scope in [document.root(), day] {
            for &child in document.children(scope) {
                if let NodeKind::Alias(alias) = document.kind(child) {
                    map.insert(&alias.name, &alias.issue_key);
                }
            }
        }
        map
    }

    fn insert(&mut self, name: &str, issue_key: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = issue_key.to_string(),
            None => self.entries.push((name.to_string(), issue_key.to_string())),
        }
    }

    /// Issue key an alias name stands for.
    pub fn key_for(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, key)| key.as_str())
    }

    /// First alias name declared for an issue key.
    pub fn alias_for(&self, issue_key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, key)| key == issue_key)
            .map(|(name, _)| name.as_str())
    }

    /// Resolves the first word of an issue line.
    pub fn resolve(&self, input: &str) -> Resolution {
        let (first, rest) = input.split_once(' ').unwrap_or((input, ""));
        let issue_key = self.key_for(first).unwrap_or(first);
        let alias = self.alias_for(issue_key).unwrap_or(issue_key);
        Resolution {
            issue_key: issue_key.to_string(),
            alias: alias.to_string(),
            comment: rest.to_string(),
        }
    }
}

/// Accumulator of the interpretation pass.
#[derive(Debug, Default)]
pub struct Interpretation {
    logs: Vec<Log>,
    current: Option<usize>,
}

impl Interpretation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The log issues are currently attached to.
    pub fn current(&self) -> Option<&Log> {
        self.current.map(|index| &self.logs[index])
    }

    /// A boundary time: closes the open log and opens a new one at `at`.
    pub fn on_boundary(&mut self, at: NaiveDateTime) {
        if let Some(index) = self.current {
            let log = &mut self.logs[index];
            let mut end = at;
            if end < log.start {
                end += Duration::days(1);
            }
            log.end = Some(end);
        }
        self.logs.push(Log::new(at));
        self.current = Some(self.logs.len() - 1);
    }

    /// A quick entry: nested under the open log if it has work, else top level.
    pub fn on_quick_entry(&mut self, log: Log) {
        match self.current {
            Some(index) if !self.logs[index].issues.is_empty() => {
                self.logs[index].children.push(log);
            }
            _ => self.logs.push(log),
        }
    }

    /// An issue line joins the open log.
    pub fn on_issue(&mut self, issue: NodeId, input: &str) -> Result<(), SyntaxError> {
        let index = self.current.ok_or_else(|| SyntaxError::MissingStart {
            input: input.to_string(),
        })?;
        self.logs[index].issues.push(issue);
        Ok(())
    }

    /// Ends a running log at `now` and drops logs that never closed.
    pub fn finish(mut self, now: NaiveDateTime) -> Vec<Log> {
        if let Some(index) = self.current {
            let log = &mut self.logs[index];
            if !log.issues.is_empty() && log.end.is_none() {
                log.end = Some(now.max(log.start));
                log.transient = true;
            }
        }
        self.logs.retain(|log| log.end.is_some());
        self.logs
    }
}

/// Interprets the document and writes alias resolutions into its issues.
pub fn interpret(
    document: &mut Document,
    config: &DocumentConfig,
    now: NaiveDateTime,
) -> Result<Vec<Log>, SyntaxError> {
    let mut state = Interpretation::new();

    for day in document.days() {
        let Some(date) = document.day(day).and_then(|d| config.parse_day(&d.date)) else {
            if let Some(d) = document.day(day) {
                tracing::warn!(date = %d.date, "skipping day with invalid date");
            }
            continue;
        };
        let aliases = AliasMap::for_day(document, day);
        let mut clock = DayClock::new(date);

        for child in document.children(day).to_vec() {
            match document.kind(child) {
                NodeKind::Time(time) => {
                    let wall = time.clock;
                    if let Some((minutes, entry)) = document.quick_entry(child) {
                        let start = clock.at(wall);
                        let mut log = Log::new(start);
                        log.end = Some(timeexpr::shift(start, minutes).ok_or_else(|| {
                            SyntaxError::InvalidDuration {
                                line: document.line_number(child).unwrap_or_default(),
                            }
                        })?);
                        if resolve_issue(document, &aliases, entry) {
                            log.issues.push(entry);
                        }
                        state.on_quick_entry(log);
                        continue;
                    }
                    state.on_boundary(clock.boundary(wall));
                }
                NodeKind::Issue(issue) => {
                    let input = issue.input.clone();
                    resolve_issue(document, &aliases, child);
                    state.on_issue(child, &input)?;
                }
                NodeKind::Root
                | NodeKind::EmptyLine
                | NodeKind::Alias(_)
                | NodeKind::Day(_)
                | NodeKind::Minutes(_)
                | NodeKind::Pause(_) => {}
            }
        }
    }

    let logs = state.finish(now);
    tracing::debug!(
        logs = logs.len(),
        running = logs.iter().any(|log| log.transient),
        "interpreted document"
    );
    Ok(logs)
}

/// The running log, if any.
pub fn running(logs: &[Log]) -> Option<&Log> {
    logs.iter().find(|log| log.transient)
}

/// Timestamp of a time node, with the midnight roll-over of its day applied.
pub fn timestamp(
    document: &Document,
    config: &DocumentConfig,
    id: NodeId,
) -> Option<NaiveDateTime> {
    let day = document.enclosing_day(id)?;
    let date = config.parse_day(&document.day(day)?.date)?;
    let mut clock = DayClock::new(date);
    for &child in document.children(day) {
        let Some(time) = document.time(child) else {
            continue;
        };
        let at = if document.quick_entry(child).is_some() {
            clock.at(time.clock)
        } else {
            clock.boundary(time.clock)
        };
        if child == id {
            return Some(at);
        }
    }
    None
}

/// Wall clocks of one day. A boundary earlier than the previous one rolls
/// over to the next date; quick entries only read the current date.
#[derive(Debug)]
struct DayClock {
    date: NaiveDate,
    previous: Option<NaiveDateTime>,
}

impl DayClock {
    const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            previous: None,
        }
    }

    fn at(&self, clock: NaiveTime) -> NaiveDateTime {
        self.date.and_time(clock)
    }

    fn boundary(&mut self, clock: NaiveTime) -> NaiveDateTime {
        let mut at = self.at(clock);
        if self.previous.is_some_and(|previous| at < previous) {
            self.date = self.date.succ_opt().unwrap_or(self.date);
            at = self.at(clock);
        }
        self.previous = Some(at);
        at
    }
}

/// Writes the resolution into an issue node. Returns false for non-issues.
fn resolve_issue(document: &mut Document, aliases: &AliasMap, id: NodeId) -> bool {
    match document.issue_mut(id) {
        Some(issue) => {
            issue.resolved = Some(aliases.resolve(&issue.input));
            true
        }
        None => false,
    }
}
