//! On-disk cache of Jira issue summaries.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use wl_jira::{IssueSummary, JiraError};

static INVALID_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"The issue key '(.*)' for field 'key' is invalid").unwrap()
});

const INVALID_KEY_MESSAGE: &str = "The issue key is invalid.";

/// Where summaries come from when they are not cached.
pub trait SummarySource {
    fn fetch(&mut self, keys: &[String]) -> Result<Vec<IssueSummary>, JiraError>;
}

/// A cached lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheEntry {
    Summary(String),
    Error(String),
}

/// Issue key to summary map persisted as JSON.
#[derive(Debug)]
pub struct SummaryCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl SummaryCache {
    /// Loads the cache; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(&key.to_uppercase())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Fetches the given keys and stores the results.
    ///
    /// Invalid keys reported by Jira are cached as errors and the remaining
    /// keys are retried. A lone key rejected with a client error caches the
    /// message.
    pub fn update<S: SummarySource>(&mut self, keys: &[String], source: &mut S) -> Result<()> {
        let mut pending: Vec<String> = keys.iter().map(|key| key.to_uppercase()).collect();

        while !pending.is_empty() {
            match source.fetch(&pending) {
                Ok(summaries) => {
                    for issue in summaries {
                        self.entries
                            .insert(issue.key, CacheEntry::Summary(issue.summary));
                    }
                    break;
                }
                Err(err) => {
                    let message = err.to_string();
                    if let Some(caps) = INVALID_KEY_RE.captures(&message) {
                        let invalid = caps[1].to_string();
                        let before = pending.len();
                        pending.retain(|key| *key != invalid);
                        if pending.len() == before {
                            return Err(err).context("failed to fetch issue summaries");
                        }
                        tracing::debug!(key = %invalid, "caching invalid issue key");
                        self.entries.insert(
                            invalid,
                            CacheEntry::Error(INVALID_KEY_MESSAGE.to_string()),
                        );
                        self.save()?;
                        continue;
                    }
                    if pending.len() == 1 && err.status() == Some(400) {
                        self.entries
                            .insert(pending.remove(0), CacheEntry::Error(message));
                        break;
                    }
                    return Err(err).context("failed to fetch issue summaries");
                }
            }
        }
        self.save()
    }

    /// Display text for a cached issue, without fetching.
    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key).map(|entry| match entry {
            CacheEntry::Summary(summary) => summary.clone(),
            CacheEntry::Error(message) => format!("ERROR: {message}"),
        })
    }
}

/// Deletes the cache file. Returns whether there was one.
pub fn clear(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    Ok(true)
}
