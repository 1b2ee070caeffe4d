//! Issue source: read-only access to the external tracker.
//!
//! [`IssueSource`] is the seam the engine depends on. [`TrackerClient`] is
//! the HTTP implementation for a Jira-style REST API (`search` with an
//! embedded changelog, `issue/{key}/worklog`).

mod client;
mod payload;

pub use client::TrackerClient;
pub use payload::parse_timestamp;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Issue, Worklog};

#[derive(Debug, Error)]
pub enum SourceError {
    /// Network, authentication or server failure reaching the tracker.
    #[error("Tracker unavailable: {0}")]
    Unavailable(String),

    /// The tracker answered, but not with the expected shape.
    #[error("Malformed tracker payload: {0}")]
    MalformedPayload(String),
}

/// Which issues to fetch. Unset parts do not constrain the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueQuery {
    pub assignee: Option<String>,
    pub project: Option<String>,
    pub issue_type: Option<String>,
    pub statuses: Vec<String>,
}

impl IssueQuery {
    pub fn assigned_to(developer: impl Into<String>) -> Self {
        Self {
            assignee: Some(developer.into()),
            ..Self::default()
        }
    }

    pub fn in_project(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = Some(issue_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.statuses.push(status.into());
        self
    }

    /// Render as JQL, oldest issues first.
    pub fn to_jql(&self) -> String {
        let mut clauses = Vec::new();
        if let Some(assignee) = &self.assignee {
            clauses.push(format!("assignee = {}", quote(assignee)));
        }
        if let Some(project) = &self.project {
            clauses.push(format!("project = {}", quote(project)));
        }
        if let Some(issue_type) = &self.issue_type {
            clauses.push(format!("issuetype = {}", quote(issue_type)));
        }
        if !self.statuses.is_empty() {
            let statuses: Vec<String> = self.statuses.iter().map(|s| quote(s)).collect();
            clauses.push(format!("status in ({})", statuses.join(", ")));
        }

        if clauses.is_empty() {
            "ORDER BY created".to_string()
        } else {
            format!("{} ORDER BY created", clauses.join(" AND "))
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A source of issues and worklogs.
///
/// Every call starts from scratch; nothing is resumable mid-stream. An `Ok`
/// result is always complete: each issue carries its full change history.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, SourceError>;

    async fn fetch_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>, SourceError>;
}
