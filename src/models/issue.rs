use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A snapshot of a tracker issue as fetched, with its full change history.
///
/// Issues are never mutated locally; every run fetches a fresh snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-unique identifier (used as the dedup record id).
    pub id: String,
    /// Human-readable key such as `PROJ-42`.
    pub key: String,
    pub status: String,
    pub issue_type: String,
    /// Logged time in seconds.
    pub time_spent: i64,
    /// Original estimate in seconds.
    pub original_estimate: i64,
    pub fix_versions: Vec<FixVersion>,
    pub subtask_count: usize,
    /// Chronological, as returned by the tracker.
    pub history: Vec<ChangeHistoryEntry>,
}

impl Issue {
    /// Every field transition of the issue, paired with the entry it belongs to,
    /// in source order.
    pub fn transitions(&self) -> impl Iterator<Item = (&ChangeHistoryEntry, &FieldTransition)> {
        self.history
            .iter()
            .flat_map(|entry| entry.items.iter().map(move |item| (entry, item)))
    }
}

/// One changelog event on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeHistoryEntry {
    /// Timestamp in the tracker's own offset; its calendar date picks the week.
    pub created: DateTime<FixedOffset>,
    pub items: Vec<FieldTransition>,
}

/// A single field change within a changelog event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransition {
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl FieldTransition {
    pub fn is(&self, field: &str) -> bool {
        self.field == field
    }

    pub fn goes_to(&self, value: &str) -> bool {
        self.to.as_deref() == Some(value)
    }

    pub fn comes_from(&self, value: &str) -> bool {
        self.from.as_deref() == Some(value)
    }
}

/// A release an issue is scheduled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixVersion {
    pub id: String,
    pub name: String,
    pub released: bool,
}

/// Time logged against an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worklog {
    pub id: String,
    pub time_spent_seconds: i64,
    pub created: DateTime<FixedOffset>,
}
