//! Time expressions, durations and rounding.
//!
//! Users give times relative to a reference (usually "now"):
//!
//! | Expression        | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `09:30`, `0930`   | that clock on the reference date          |
//! | `45`              | minute 45 of the reference hour           |
//! | `+15`, `+1h`      | reference plus duration                   |
//! | `-15`, `_15`      | reference minus duration                  |
//! | `1h 30m`          | reference plus duration                   |
//! | `~...`            | any of the above, rounded                 |

use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use thiserror::Error;

static DURATION_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([hm])$").unwrap());

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

static COMPACT_CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})$").unwrap());

static MINUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}$").unwrap());

/// Durations at or above this many minutes are rejected before the cast.
#[allow(clippy::cast_precision_loss)]
const MAX_MINUTES: f64 = i64::MAX as f64;

/// Errors from parsing user supplied times.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid time: {input}")]
    InvalidTime { input: String },
}

/// Parses a whitespace separated duration such as `1h 30m` or `0.5h`.
///
/// Bare numbers count as minutes only when `allow_bare` is set. Returns
/// `None` for empty input or any unrecognized token.
pub fn parse_duration(text: &str, allow_bare: bool) -> Option<i64> {
    let mut total = 0.0_f64;
    let mut any = false;
    for token in text.split_whitespace() {
        any = true;
        if allow_bare && token.bytes().all(|b| b.is_ascii_digit()) {
            total += token.parse::<f64>().ok()?;
            continue;
        }
        let caps = DURATION_TOKEN_RE.captures(token)?;
        let (_, [value, unit]) = caps.extract();
        let value: f64 = value.parse().ok()?;
        total += if unit == "h" { value * 60.0 } else { value };
    }
    if !total.is_finite() || total.abs() >= MAX_MINUTES {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let minutes = total.round() as i64;
    any.then_some(minutes)
}

/// `reference` moved by `minutes`, or `None` when that leaves chrono's range.
pub fn shift(reference: NaiveDateTime, minutes: i64) -> Option<NaiveDateTime> {
    Duration::try_minutes(minutes).and_then(|delta| reference.checked_add_signed(delta))
}

/// Evaluates a time expression against `reference`.
pub fn parse_time(
    expr: &str,
    reference: NaiveDateTime,
    round_minutes: u32,
) -> Result<NaiveDateTime, TimeError> {
    let invalid = || TimeError::InvalidTime {
        input: expr.to_string(),
    };
    let trimmed = expr.trim();
    let (rounded, body) = trimmed
        .strip_prefix('~')
        .map_or((false, trimmed), |rest| (true, rest.trim()));

    let offset = |text: &str, allow_bare: bool, sign: i64| {
        parse_duration(text, allow_bare)
            .and_then(|minutes| minutes.checked_mul(sign))
            .and_then(|minutes| shift(reference, minutes))
            .ok_or_else(invalid)
    };

    let result = if let Some(rest) = body.strip_prefix('+') {
        offset(rest, true, 1)?
    } else if let Some(rest) = body.strip_prefix(['-', '_']) {
        offset(rest, true, -1)?
    } else if let Some(caps) = CLOCK_RE
        .captures(body)
        .or_else(|| COMPACT_CLOCK_RE.captures(body))
    {
        let (_, [hour, minute]) = caps.extract();
        let clock = NaiveTime::from_hms_opt(
            hour.parse().map_err(|_| invalid())?,
            minute.parse().map_err(|_| invalid())?,
            0,
        )
        .ok_or_else(invalid)?;
        reference.date().and_time(clock)
    } else if MINUTE_RE.is_match(body) {
        let minute: u32 = body.parse().map_err(|_| invalid())?;
        let clock = NaiveTime::from_hms_opt(reference.hour(), minute, 0).ok_or_else(invalid)?;
        reference.date().and_time(clock)
    } else {
        offset(body, false, 1)?
    };

    Ok(if rounded {
        round(result, round_minutes)
    } else {
        result
    })
}

/// Drops seconds, then rounds half up to a multiple of `granularity` minutes.
pub fn round(time: NaiveDateTime, granularity: u32) -> NaiveDateTime {
    let granularity = granularity.max(1);
    let minutes = time.hour() * 60 + time.minute();
    let rounded = (minutes + granularity / 2) / granularity * granularity;
    time.date().and_time(NaiveTime::MIN) + Duration::minutes(i64::from(rounded))
}

/// Formats minutes as `1d 2h 5m`. Zero is `0m`.
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return format!("-{}", format_minutes(-minutes));
    }
    let days = minutes / (24 * 60);
    let hours = minutes % (24 * 60) / 60;
    let rest = minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if rest > 0 {
        parts.push(format!("{rest}m"));
    }
    if parts.is_empty() {
        return "0m".to_string();
    }
    parts.join(" ")
}
