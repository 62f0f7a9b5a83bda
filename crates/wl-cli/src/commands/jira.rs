//! Blocking adapters that drive the async Jira client from commands.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use tokio::runtime::Runtime;
use wl_core::{IssueKey, Ledger};
use wl_jira::{Client, IssueSummary, JiraError, Worklog};

use crate::Config;
use crate::summaries::SummarySource;

/// A Jira client together with the runtime that drives it.
#[derive(Debug)]
pub struct Jira {
    client: Client,
    runtime: Runtime,
}

impl Jira {
    /// Connects using the configured host and credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some((host, user, token)) = config.jira_credentials() else {
            bail!("Jira is not configured: set jira_host, jira_user and jira_token");
        };
        let client = Client::new(host, user, token).context("failed to create Jira client")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to initialize tokio runtime")?;
        Ok(Self { client, runtime })
    }
}

impl SummarySource for Jira {
    fn fetch(&mut self, keys: &[String]) -> Result<Vec<IssueSummary>, JiraError> {
        tracing::debug!(count = keys.len(), "fetching issue summaries");
        self.runtime.block_on(self.client.issue_summaries(keys))
    }
}

impl Ledger for Jira {
    type Error = JiraError;

    fn submit(
        &mut self,
        issue: &IssueKey,
        comment: &str,
        started: NaiveDateTime,
        minutes: i64,
    ) -> Result<(), JiraError> {
        let worklog = Worklog {
            issue_key: issue.clone(),
            comment: comment.to_string(),
            started: local_offset(started),
            minutes,
        };
        self.runtime.block_on(self.client.add_worklog(&worklog))
    }
}

/// Attaches the local UTC offset. Times skipped by a DST change fall back
/// to UTC.
fn local_offset(time: NaiveDateTime) -> DateTime<FixedOffset> {
    time.and_local_timezone(Local)
        .earliest()
        .map_or_else(|| time.and_utc().fixed_offset(), |local| local.fixed_offset())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn missing_credentials_are_reported() {
        let err = Jira::from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("jira_host"));
    }

    #[test]
    fn configured_client_builds() {
        let config = Config {
            jira_host: Some("https://jira.example.com/".to_string()),
            jira_user: Some("me@example.com".to_string()),
            jira_token: Some("token".to_string()),
            ..Config::default()
        };
        assert!(Jira::from_config(&config).is_ok());
    }

    #[test]
    fn local_offset_keeps_wall_clock() {
        let time = NaiveDate::from_ymd_opt(2022, 11, 25)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(local_offset(time).naive_local(), time);
    }
}
