//! Document format settings.

use chrono::NaiveDate;
use regex::Regex;

use crate::types::ValidationError;

/// Default `strftime` format of day headers (`25.11.2022`).
pub const DEFAULT_DAY_FORMAT: &str = "%d.%m.%Y";

/// Default pattern recognizing a day header. Group 1 is the date.
pub const DEFAULT_DAY_PATTERN: &str = r"^(\d{2}\.\d{2}\.\d{4})";

/// Default decoration written after the date of newly created day headers.
pub const DEFAULT_DAY_DECORATION: &str =
    " +++++++++++++++++++++++++++++++++++++++++++++++++++++++++++++++";

/// Default rounding granularity in minutes.
pub const DEFAULT_ROUND_MINUTES: u32 = 5;

/// How day headers look and how times are rounded.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// `strftime` format of the date in day headers.
    pub day_format: String,

    /// Regex recognizing day headers. Capture group 1 (or the whole match
    /// when the pattern has no group) is the date; the remainder of the line
    /// is kept verbatim as decoration.
    pub day_pattern: Regex,

    /// Decoration appended to headers of days created by the editor.
    pub day_decoration: String,

    /// Granularity used when rounding "now". Default: 5.
    pub round_minutes: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            day_format: DEFAULT_DAY_FORMAT.to_string(),
            day_pattern: Regex::new(DEFAULT_DAY_PATTERN).unwrap(),
            day_decoration: DEFAULT_DAY_DECORATION.to_string(),
            round_minutes: DEFAULT_ROUND_MINUTES,
        }
    }
}

impl DocumentConfig {
    /// Builds a config from raw settings, validating the pattern and rounding.
    pub fn new(
        day_format: impl Into<String>,
        day_pattern: &str,
        day_decoration: impl Into<String>,
        round_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let day_pattern =
            Regex::new(day_pattern).map_err(|err| ValidationError::InvalidDayPattern {
                pattern: day_pattern.to_string(),
                reason: err.to_string(),
            })?;
        if round_minutes == 0 || round_minutes > 60 {
            return Err(ValidationError::InvalidRounding {
                value: round_minutes,
            });
        }
        Ok(Self {
            day_format: day_format.into(),
            day_pattern,
            day_decoration: day_decoration.into(),
            round_minutes,
        })
    }

    /// Splits a trimmed line into `(date, decoration)` if it is a day header.
    pub fn match_day<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.day_pattern.captures(line)?;
        let date = caps.get(1).or_else(|| caps.get(0))?;
        if date.start() != 0 {
            return None;
        }
        Some((date.as_str(), &line[date.end()..]))
    }

    /// Parses a header date, accepting it only if formatting the parsed date
    /// reproduces the exact text (`00.10.2022` or `1.2.2022` are rejected).
    pub fn parse_day(&self, date: &str) -> Option<NaiveDate> {
        let parsed = NaiveDate::parse_from_str(date, &self.day_format).ok()?;
        (self.format_day(parsed) == date).then_some(parsed)
    }

    /// Formats a date the way day headers spell it.
    pub fn format_day(&self, date: NaiveDate) -> String {
        date.format(&self.day_format).to_string()
    }
}
