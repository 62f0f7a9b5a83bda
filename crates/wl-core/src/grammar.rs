//! Line classification.
//!
//! Every line of a work log document is exactly one of: blank, alias
//! declaration, day header, time (boundary or quick entry) or entry
//! (issue / pause). Classification works on a single trimmed line and never
//! looks at its neighbours; nesting is the parser's job.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use thiserror::Error;

use crate::config::DocumentConfig;
use crate::types::ISSUE_KEY_PATTERN;

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^({ISSUE_KEY_PATTERN}) as ([_A-Za-z0-9]+)$")).unwrap()
});

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(.*)$").unwrap());

static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)m(.*)$").unwrap());

/// Errors raised while classifying a single line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    /// Text after a clock that is not a `<minutes>m` quick entry.
    #[error("unexpected sequence {sequence:?}")]
    UnexpectedSequence { sequence: String },

    /// A clock with an hour above 23 or a minute above 59.
    #[error("invalid time {clock:?}")]
    InvalidClock { clock: String },
}

/// An issue or pause as written in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Issue { input: &'a str, done: bool },
    Pause { done: bool },
}

/// The `<minutes>m <entry>` part of a standalone time line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickEntry<'a> {
    pub minutes: i64,
    pub entry: Entry<'a>,
}

/// Classification of one trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Empty,
    Alias {
        issue_key: &'a str,
        name: &'a str,
    },
    Day {
        date: &'a str,
        decoration: &'a str,
    },
    Time {
        clock: NaiveTime,
        entry: Option<QuickEntry<'a>>,
    },
    Entry(Entry<'a>),
}

/// Classifies a line. Leading and trailing whitespace is ignored.
pub fn classify<'a>(line: &'a str, config: &DocumentConfig) -> Result<Line<'a>, LineError> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(Line::Empty);
    }
    if let Some(caps) = ALIAS_RE.captures(line) {
        let (_, [issue_key, name]) = caps.extract();
        return Ok(Line::Alias { issue_key, name });
    }
    if let Some((date, decoration)) = config.match_day(line) {
        return Ok(Line::Day { date, decoration });
    }
    if let Some((clock, rest)) = split_clock(line) {
        let clock = parse_clock(clock).ok_or_else(|| LineError::InvalidClock {
            clock: clock.to_string(),
        })?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Ok(Line::Time { clock, entry: None });
        }
        let entry = parse_quick_entry(rest).ok_or_else(|| LineError::UnexpectedSequence {
            sequence: rest.to_string(),
        })?;
        return Ok(Line::Time {
            clock,
            entry: Some(entry),
        });
    }

    Ok(Line::Entry(parse_entry(line)))
}

/// Splits `HH:MM rest` into the clock text and the rest.
fn split_clock(line: &str) -> Option<(&str, &str)> {
    let caps = CLOCK_RE.captures(line)?;
    let rest = caps.get(3)?;
    Some((&line[..rest.start()], rest.as_str()))
}

/// Parses `H:MM` or `HH:MM` into a wall clock time.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = text.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parses `<digits>m[ entry]`.
pub fn parse_quick_entry(text: &str) -> Option<QuickEntry<'_>> {
    let caps = MINUTES_RE.captures(text)?;
    let (_, [minutes, rest]) = caps.extract();
    Some(QuickEntry {
        minutes: minutes.parse().ok()?,
        entry: parse_entry(rest.trim()),
    })
}

/// Parses the text of an issue or pause line.
pub fn parse_entry(text: &str) -> Entry<'_> {
    match text {
        "" => Entry::Pause { done: false },
        "x" => Entry::Pause { done: true },
        _ => text.strip_suffix(" x").map_or(
            Entry::Issue {
                input: text,
                done: false,
            },
            |input| Entry::Issue { input, done: true },
        ),
    }
}
