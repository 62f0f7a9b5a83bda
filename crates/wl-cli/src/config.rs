//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wl_core::config::{
    DEFAULT_DAY_DECORATION, DEFAULT_DAY_FORMAT, DEFAULT_DAY_PATTERN, DEFAULT_ROUND_MINUTES,
};
use wl_core::{DocumentConfig, ValidationError};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the work log file.
    pub file: PathBuf,

    /// Path to the issue summary cache.
    pub cache_path: PathBuf,

    /// `strftime` format of day headers.
    pub day_format: String,

    /// Regex recognizing day headers.
    pub day_pattern: String,

    /// Decoration appended to new day headers.
    pub day_decoration: String,

    /// Rounding granularity in minutes.
    pub round_minutes: u32,

    /// Jira base URL, e.g. `https://example.atlassian.net`.
    pub jira_host: Option<String>,

    pub jira_user: Option<String>,

    /// API token for basic authentication.
    pub jira_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("file", &self.file)
            .field("cache_path", &self.cache_path)
            .field("day_format", &self.day_format)
            .field("day_pattern", &self.day_pattern)
            .field("day_decoration", &self.day_decoration)
            .field("round_minutes", &self.round_minutes)
            .field("jira_host", &self.jira_host)
            .field("jira_user", &self.jira_user)
            .field("jira_token", &self.jira_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let cache_dir = dirs_cache_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            file: data_dir.join("worklog.txt"),
            cache_path: cache_dir.join("summaries.json"),
            day_format: DEFAULT_DAY_FORMAT.to_string(),
            day_pattern: DEFAULT_DAY_PATTERN.to_string(),
            day_decoration: DEFAULT_DAY_DECORATION.to_string(),
            round_minutes: DEFAULT_ROUND_MINUTES,
            jira_host: None,
            jira_user: None,
            jira_token: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WL_*)
        figment = figment.merge(Env::prefixed("WL_"));

        figment.extract()
    }

    /// Document settings for the core, validated.
    pub fn document_config(&self) -> Result<DocumentConfig, ValidationError> {
        DocumentConfig::new(
            self.day_format.as_str(),
            &self.day_pattern,
            self.day_decoration.as_str(),
            self.round_minutes,
        )
    }

    /// Jira host, user and token, when all three are set.
    pub fn jira_credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.jira_host.as_deref()?,
            self.jira_user.as_deref()?,
            self.jira_token.as_deref()?,
        ))
    }
}

/// Returns the platform-specific config directory for wl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wl"))
}

/// Returns the platform-specific data directory for wl.
///
/// On Linux: `~/.local/share/wl`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wl"))
}

/// Returns the platform-specific cache directory for wl.
///
/// On Linux: `~/.cache/wl`
pub fn dirs_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("wl"))
}
