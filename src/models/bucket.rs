use std::fmt;

use serde::Serialize;

use super::WeekKey;

/// The window a counter is kept for.
///
/// Time-series metrics are bucketed by ISO week. Release progress is bucketed
/// by fix-version name and estimate accuracy by issue key, both carried as a
/// [`Bucket::Label`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Bucket {
    Week(WeekKey),
    Label(String),
}

impl Bucket {
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }
}

impl From<WeekKey> for Bucket {
    fn from(week: WeekKey) -> Self {
        Self::Week(week)
    }
}

impl From<Bucket> for String {
    fn from(bucket: Bucket) -> Self {
        bucket.to_string()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week(week) => week.fmt(f),
            Self::Label(label) => f.write_str(label),
        }
    }
}
