//! Core type definitions with validation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pattern shared by issue keys in documents, aliases and command arguments.
pub(crate) const ISSUE_KEY_PATTERN: &str = r"[A-Z]{2,}-[0-9]+";

static ISSUE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{ISSUE_KEY_PATTERN}$")).unwrap());

static ISSUE_KEY_SEARCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ISSUE_KEY_PATTERN).unwrap());

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The value is not shaped like `ABC-123`.
    #[error("invalid issue key: {value}")]
    InvalidIssueKey { value: String },

    /// The day pattern is not a usable regular expression.
    #[error("invalid day pattern {pattern:?}: {reason}")]
    InvalidDayPattern { pattern: String, reason: String },

    /// Rounding granularity must be at least one minute.
    #[error("rounding granularity must be between 1 and 60 minutes, got {value}")]
    InvalidRounding { value: u32 },
}

/// A validated issue key such as `TEST-12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Creates a new key after validation.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ValidationError::Empty { field: "issue key" });
        }
        if !ISSUE_KEY_RE.is_match(&key) {
            return Err(ValidationError::InvalidIssueKey { value: key });
        }
        Ok(Self(key))
    }

    /// Extracts the first issue key embedded in arbitrary text, e.g. a branch
    /// name like `feature/TEST-12-login` or a tracker URL.
    pub fn find_in(text: &str) -> Option<Self> {
        ISSUE_KEY_SEARCH_RE
            .find(text)
            .map(|m| Self(m.as_str().to_string()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for IssueKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
