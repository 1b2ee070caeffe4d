//! Run configuration.
//!
//! Loaded from a JSON file, then overridden from the environment:
//! - `ROLLUP_TRACKER_URL` - Base URL of the tracker REST API
//! - `ROLLUP_TRACKER_USERNAME` / `ROLLUP_TRACKER_PASSWORD` - Basic auth credentials
//! - `ROLLUP_DB` - Path of the SQLite store

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::metrics::Vocabulary;
use crate::models::{Subject, SubjectKind};

const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_RESULTS: u32 = 2000;
const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Upper bound on subjects processed at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the REST API, e.g. `https://example.atlassian.net/rest/api/2`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Cap on issues fetched for a single query, across all pages.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Config {
    /// Load from `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ROLLUP_TRACKER_URL") {
            self.tracker.url = url;
        }
        if let Some(username) = lookup("ROLLUP_TRACKER_USERNAME") {
            self.tracker.username = Some(username);
        }
        if let Some(password) = lookup("ROLLUP_TRACKER_PASSWORD") {
            self.tracker.password = Some(password);
        }
        if let Some(path) = lookup("ROLLUP_DB") {
            self.store.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.url.trim().is_empty() {
            return Err(ConfigError::Invalid("tracker.url is required".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.tracker.page_size == 0 {
            return Err(ConfigError::Invalid(
                "tracker.page_size must be at least 1".to_string(),
            ));
        }
        if let Some(team) = self.teams.iter().find(|t| t.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "team with members {:?} has no name",
                team.members
            )));
        }
        Ok(())
    }

    pub fn roster(&self) -> Roster {
        Roster {
            teams: self.teams.clone(),
            projects: self.projects.clone(),
        }
    }
}

/// Who the reports are computed for.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub teams: Vec<Team>,
    pub projects: Vec<String>,
}

impl Roster {
    /// Every developer of every team, each once, in first-seen order.
    pub fn developers(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.teams
            .iter()
            .flat_map(|team| team.members.iter())
            .filter(|member| seen.insert(member.as_str()))
            .cloned()
            .collect()
    }

    pub fn subjects(&self, kind: SubjectKind) -> Vec<Subject> {
        match kind {
            SubjectKind::Developer => self.developers().into_iter().map(Subject::developer).collect(),
            SubjectKind::Team => self.teams.iter().map(|t| Subject::team(&t.name)).collect(),
            SubjectKind::Project => self.projects.iter().map(Subject::project).collect(),
        }
    }
}
