//! HTTP client for a Jira-style tracker REST API.
//!
//! Base URL points at the API root, e.g. `https://tracker.example.com/rest/api/2`.
//! Credentials, when present, are sent as HTTP basic auth.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::payload::{ChangelogPage, IssuePayload, SearchPage, WorklogPage};
use super::{IssueQuery, IssueSource, SourceError};
use crate::config::TrackerConfig;
use crate::models::{Issue, Worklog};

const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_RESULTS: u32 = 2000;

#[derive(Debug, Clone)]
pub struct TrackerClient {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    page_size: u32,
    max_results: u32,
    client: Client,
}

impl TrackerClient {
    pub fn new(base_url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username,
            password,
            page_size: DEFAULT_PAGE_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(&config.url, config.username.clone(), config.password.clone())
            .with_paging(config.page_size, config.max_results)
    }

    /// Page size per request and the cap on results collected per query.
    pub fn with_paging(mut self, page_size: u32, max_results: u32) -> Self {
        self.page_size = page_size.max(1);
        self.max_results = max_results;
        self
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.get(&url);
        if let Some(ref username) = self.username {
            req = req.basic_auth(username, self.password.as_ref());
        }
        req
    }

    /// Send, then map HTTP failures to `Unavailable` and undecodable bodies to `MalformedPayload`.
    async fn fetch<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, SourceError> {
        let response = req
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        match status {
            s if s.is_success() => {
                serde_json::from_str(&body).map_err(|e| SourceError::MalformedPayload(e.to_string()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unavailable(
                format!("authentication rejected ({})", status),
            )),
            _ => Err(SourceError::Unavailable(format!("{}: {}", status, body))),
        }
    }

    /// Page in the changelog entries `search` left out, so the issue carries
    /// its whole history.
    async fn complete_changelog(&self, payload: &mut IssuePayload) -> Result<(), SourceError> {
        let Some(changelog) = payload.changelog.as_mut() else {
            return Ok(());
        };
        if changelog.missing() == 0 {
            return Ok(());
        }

        let path = format!("/issue/{}/changelog", payload.key);
        while changelog.missing() > 0 {
            let start_at = changelog.histories.len() as u32;
            let req = self.request(&path).query(&[
                ("startAt", start_at.to_string()),
                ("maxResults", changelog.missing().min(self.page_size).to_string()),
            ]);
            let page: ChangelogPage = self.fetch(req).await?;

            if page.values.is_empty() {
                return Err(SourceError::MalformedPayload(format!(
                    "issue {}: changelog ended after {} of {} entries",
                    payload.key,
                    start_at,
                    changelog.total.unwrap_or(start_at)
                )));
            }
            changelog.histories.extend(page.values);
        }

        tracing::debug!(issue = %payload.key, entries = changelog.histories.len(), "Paged in changelog");
        Ok(())
    }

    fn page_len(&self, collected: usize) -> u32 {
        let remaining = (self.max_results as usize).saturating_sub(collected);
        (remaining as u32).min(self.page_size)
    }
}

#[async_trait]
impl IssueSource for TrackerClient {
    async fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, SourceError> {
        let jql = query.to_jql();
        let mut issues = Vec::new();
        let mut start_at: u32 = 0;

        loop {
            let max = self.page_len(issues.len());
            if max == 0 {
                tracing::warn!(jql = %jql, cap = self.max_results, "Result cap reached, truncating");
                break;
            }

            let req = self.request("/search").query(&[
                ("jql", jql.clone()),
                ("startAt", start_at.to_string()),
                ("maxResults", max.to_string()),
                ("expand", "changelog".to_string()),
            ]);
            let page: SearchPage = self.fetch(req).await?;

            let received = page.issues.len() as u32;
            for mut payload in page.issues {
                self.complete_changelog(&mut payload).await?;
                issues.push(payload.into_issue()?);
            }
            start_at += received;

            if received == 0 || start_at >= page.total {
                break;
            }
        }

        tracing::debug!(jql = %jql, count = issues.len(), "Fetched issues");
        Ok(issues)
    }

    async fn fetch_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>, SourceError> {
        let path = format!("/issue/{}/worklog", issue_key);
        let mut worklogs = Vec::new();
        let mut start_at: u32 = 0;

        loop {
            let max = self.page_len(worklogs.len());
            if max == 0 {
                break;
            }

            let req = self.request(&path).query(&[
                ("startAt", start_at.to_string()),
                ("maxResults", max.to_string()),
            ]);
            let page: WorklogPage = self.fetch(req).await?;

            let received = page.worklogs.len() as u32;
            for payload in page.worklogs {
                worklogs.push(payload.into_worklog()?);
            }
            start_at += received;

            if received == 0 || start_at >= page.total {
                break;
            }
        }

        Ok(worklogs)
    }
}
