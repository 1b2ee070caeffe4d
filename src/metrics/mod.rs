//! Metric derivers.
//!
//! Each deriver is a pure function from a fetched record (an issue with its
//! history, or a worklog) to [`Fold`]s: the counter deltas a record
//! contributes plus the ledger entry that marks it counted. Gauges are
//! computed separately from accumulator values once a subject's records have
//! all been folded, so they never depend on processing order.

pub mod defect_ratio;
pub mod estimate;
pub mod meetings;
pub mod progress;
pub mod velocity;
mod vocabulary;

pub use vocabulary::Vocabulary;

use std::collections::BTreeSet;

use crate::models::{Bucket, Metric};
use crate::store::Ledger;

/// A positive increment to one accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub metric: Metric,
    pub bucket: Bucket,
    pub amount: f64,
}

impl Delta {
    pub fn new(metric: Metric, bucket: impl Into<Bucket>, amount: f64) -> Self {
        Self {
            metric,
            bucket: bucket.into(),
            amount,
        }
    }
}

/// Everything one source record contributes, committed at most once per
/// subject under `record_id` in `ledger`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub ledger: Ledger,
    pub record_id: String,
    pub deltas: Vec<Delta>,
}

impl Fold {
    /// Distinct buckets the fold writes to.
    pub fn buckets(&self) -> BTreeSet<Bucket> {
        self.deltas.iter().map(|d| d.bucket.clone()).collect()
    }
}
