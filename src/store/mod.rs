//! Shared key-value store used for dedup ledgers and aggregate counters.
//!
//! The engine only relies on five primitives with per-key atomicity: set
//! membership test, set add, hash-field get, hash-field atomic increment and
//! hash-field set. Anything offering those can back a run; [`crate::db::Database`]
//! provides them on SQLite.
//!
//! Composite state (subject, week, record kind) is kept structured everywhere
//! else and only flattened to string keys by [`keys`].

mod aggregates;
pub mod keys;
mod ledger;

pub use aggregates::AggregateStore;
pub use ledger::{DedupLedger, Ledger};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// One hash-field increment that is part of a record's commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Increment {
    pub key: String,
    pub field: String,
    pub amount: f64,
}

/// The store primitives, plus read-only listings for consumers.
///
/// Implementations must be safe to call from many workers at once and must
/// not buffer writes across callers: every call is a complete round trip.
pub trait Store: Send + Sync {
    fn is_member(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    /// Returns `true` if the member was not already present.
    fn add_member(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    fn members(&self, set: &str) -> Result<Vec<String>, StoreError>;

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<f64>, StoreError>;

    /// Atomically adds `amount` and returns the new value.
    fn hash_incr(&self, key: &str, field: &str, amount: f64) -> Result<f64, StoreError>;

    fn hash_set(&self, key: &str, field: &str, value: f64) -> Result<(), StoreError>;

    /// All fields of a hash, ordered by field name.
    fn hash_get_all(&self, key: &str) -> Result<Vec<(String, f64)>, StoreError>;

    /// Apply `increments` and add `member` to `set` as one unit, unless
    /// `member` is already there. Returns whether the record was counted.
    ///
    /// Either every increment and the mark land, or none of them do. A record
    /// left half-applied would be applied again by the next run.
    fn commit_once(
        &self,
        set: &str,
        member: &str,
        increments: &[Increment],
    ) -> Result<bool, StoreError>;
}
