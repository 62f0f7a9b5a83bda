//! Jira REST integration for the work log.
//!
//! Provides the two calls the work log needs:
//! - Adding a worklog record to an issue
//! - Looking up issue summaries for display

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wl_core::IssueKey;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const WORKLOG_STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Jira client errors.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Host or credentials are unusable.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl JiraError {
    /// HTTP status of an API error.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One worklog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worklog {
    pub issue_key: IssueKey,
    pub comment: String,
    pub started: DateTime<FixedOffset>,
    pub minutes: i64,
}

/// Summary of an issue as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    pub key: String,
    pub summary: String,
}

/// Jira REST client using basic authentication.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    host: String,
    user: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for `host` (e.g. `https://example.atlassian.net`).
    ///
    /// # Errors
    ///
    /// Returns an error if any argument is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, JiraError> {
        let host = host.into();
        let user = user.into();
        let token = token.into();

        if host.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "host cannot be empty",
            });
        }
        if user.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "user cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            user,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }

    /// Adds a worklog record to its issue.
    pub async fn add_worklog(&self, worklog: &Worklog) -> Result<(), JiraError> {
        let url = self.url(&format!(
            "/rest/api/2/issue/{}/worklog",
            worklog.issue_key
        ));
        let response = self
            .http
            .post(url)
            .basic_auth(&self.user, Some(&self.token))
            .json(&WorklogRequest::from(worklog))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(parse_api_error(status.as_u16(), &body));
        }
        tracing::debug!(issue = %worklog.issue_key, minutes = worklog.minutes, "added worklog");
        Ok(())
    }

    /// Fetches the summaries of the given issue keys in one search.
    pub async fn issue_summaries(&self, keys: &[String]) -> Result<Vec<IssueSummary>, JiraError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let jql = format!("key in ({})", keys.join(","));
        let max_results = keys.len().to_string();
        let response = self
            .http
            .get(self.url("/rest/api/2/search"))
            .basic_auth(&self.user, Some(&self.token))
            .query(&[
                ("jql", jql.as_str()),
                ("fields", "summary"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status.as_u16(), &body));
        }
        parse_search_response(&body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorklogRequest {
    comment: String,
    started: String,
    time_spent_seconds: i64,
}

impl From<&Worklog> for WorklogRequest {
    fn from(worklog: &Worklog) -> Self {
        Self {
            comment: worklog.comment.clone(),
            started: worklog.started.format(WORKLOG_STARTED_FORMAT).to_string(),
            time_spent_seconds: worklog.minutes * 60,
        }
    }
}

fn parse_search_response(body: &str) -> Result<Vec<IssueSummary>, JiraError> {
    #[derive(Deserialize)]
    struct SearchResponse {
        issues: Vec<SearchIssue>,
    }

    #[derive(Deserialize)]
    struct SearchIssue {
        key: String,
        fields: SearchFields,
    }

    #[derive(Deserialize)]
    struct SearchFields {
        #[serde(default)]
        summary: String,
    }

    let payload: SearchResponse =
        serde_json::from_str(body).map_err(|err| JiraError::InvalidResponse(err.to_string()))?;
    Ok(payload
        .issues
        .into_iter()
        .map(|issue| IssueSummary {
            key: issue.key,
            summary: issue.fields.summary,
        })
        .collect())
}

fn parse_api_error(status: u16, body: &str) -> JiraError {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct ErrorPayload {
        #[serde(default)]
        error_messages: Vec<String>,
        #[serde(default)]
        errors: serde_json::Map<String, serde_json::Value>,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| {
            payload.error_messages.into_iter().next().or_else(|| {
                payload
                    .errors
                    .into_iter()
                    .find_map(|(_, value)| value.as_str().map(str::to_string))
            })
        })
        .unwrap_or_else(|| format!("status {status}: {}", body.trim()));
    JiraError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn client() -> Client {
        Client::new("https://jira.example.com/", "me@example.com", "secret-token").unwrap()
    }

    #[test]
    fn client_rejects_empty_credentials() {
        for (host, user, token) in [
            ("", "u", "t"),
            ("https://jira", "  ", "t"),
            ("https://jira", "u", ""),
        ] {
            assert!(matches!(
                Client::new(host, user, token),
                Err(JiraError::InvalidCredentials { .. })
            ));
        }
    }

    #[test]
    fn client_debug_redacts_token() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("me@example.com"));
    }

    #[test]
    fn urls_join_without_double_slash() {
        assert_eq!(
            client().url("/rest/api/2/search"),
            "https://jira.example.com/rest/api/2/search"
        );
    }

    #[test]
    fn worklog_request_body() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let worklog = Worklog {
            issue_key: IssueKey::new("TEST-1").unwrap(),
            comment: "review".to_string(),
            started: offset.with_ymd_and_hms(2022, 11, 25, 9, 0, 0).unwrap(),
            minutes: 90,
        };
        let body = serde_json::to_value(WorklogRequest::from(&worklog)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "comment": "review",
                "started": "2022-11-25T09:00:00.000+0100",
                "timeSpentSeconds": 5400,
            })
        );
    }

    #[test]
    fn search_response_yields_summaries() {
        let body = r#"{"issues":[
            {"key":"TEST-1","fields":{"summary":"Login page"}},
            {"key":"TEST-2","fields":{}}
        ]}"#;
        assert_eq!(
            parse_search_response(body).unwrap(),
            vec![
                IssueSummary {
                    key: "TEST-1".to_string(),
                    summary: "Login page".to_string(),
                },
                IssueSummary {
                    key: "TEST-2".to_string(),
                    summary: String::new(),
                },
            ]
        );
        assert!(matches!(
            parse_search_response("<html>"),
            Err(JiraError::InvalidResponse(_))
        ));
    }

    #[test]
    fn api_error_prefers_error_messages() {
        let err = parse_api_error(
            400,
            r#"{"errorMessages":["The issue key 'FOO-1' for field 'key' is invalid."],"warningMessages":[]}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "The issue key 'FOO-1' for field 'key' is invalid."
        );
    }

    #[test]
    fn api_error_falls_back_to_field_errors_and_body() {
        let err = parse_api_error(400, r#"{"errorMessages":[],"errors":{"timeSpent":"Invalid"}}"#);
        assert_eq!(err.to_string(), "Invalid");

        let err = parse_api_error(502, "Bad Gateway\n");
        assert_eq!(err.to_string(), "status 502: Bad Gateway");
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let client = Client::new("http://127.0.0.1:9", "u", "t").unwrap();
        let result = client.issue_summaries(&["TEST-1".to_string()]).await;
        assert!(matches!(result, Err(JiraError::Request(_))));
        assert!(client.issue_summaries(&[]).await.unwrap().is_empty());
    }
}
