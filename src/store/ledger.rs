use crate::models::Subject;

use super::{keys, Store, StoreError};

/// The kinds of records a subject's ledger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ledger {
    /// Issues folded into velocity, by issue id.
    VelocityLogs,
    /// Worklogs folded into meeting time, by worklog id.
    WorkLogs,
    /// `<issue-id>:<version-id>` pairs counted toward a release's total.
    ProgressLogs,
    /// `<issue-id>:<version-id>` pairs counted as complete.
    ProgressCompleteLogs,
}

impl Ledger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VelocityLogs => "velocityLogs",
            Self::WorkLogs => "workLogs",
            Self::ProgressLogs => "progressLogs",
            Self::ProgressCompleteLogs => "progressCompleteLogs",
        }
    }
}

/// Record ids already folded into a subject's aggregates.
pub struct DedupLedger<'a> {
    store: &'a dyn Store,
    key: String,
}

impl<'a> DedupLedger<'a> {
    pub fn new(store: &'a dyn Store, ledger: Ledger, subject: &Subject) -> Self {
        Self {
            store,
            key: keys::ledger_key(ledger, subject),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seen(&self, record_id: &str) -> Result<bool, StoreError> {
        self.store.is_member(&self.key, record_id)
    }

    pub fn mark_seen(&self, record_id: &str) -> Result<(), StoreError> {
        self.store.add_member(&self.key, record_id)?;
        Ok(())
    }
}
