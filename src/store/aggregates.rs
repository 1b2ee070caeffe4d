use crate::metrics::Fold;
use crate::models::{Bucket, Metric, Subject};

use super::{keys, DedupLedger, Increment, Store, StoreError};

/// Typed access to counters addressed by (metric, subject, bucket).
pub struct AggregateStore<'a> {
    store: &'a dyn Store,
}

impl<'a> AggregateStore<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub fn increment(
        &self,
        metric: Metric,
        subject: &Subject,
        bucket: &Bucket,
        amount: f64,
    ) -> Result<f64, StoreError> {
        debug_assert!(!metric.is_gauge(), "{:?} is a gauge", metric);
        self.store.hash_incr(
            &keys::counter_key(metric, subject),
            &keys::counter_field(metric, bucket),
            amount,
        )
    }

    /// Current value, `0` when the counter was never written.
    pub fn get(&self, metric: Metric, subject: &Subject, bucket: &Bucket) -> Result<f64, StoreError> {
        Ok(self
            .store
            .hash_get(
                &keys::counter_key(metric, subject),
                &keys::counter_field(metric, bucket),
            )?
            .unwrap_or(0.0))
    }

    pub fn set_gauge(
        &self,
        metric: Metric,
        subject: &Subject,
        bucket: &Bucket,
        value: f64,
    ) -> Result<(), StoreError> {
        debug_assert!(metric.is_gauge(), "{:?} is an accumulator", metric);
        self.store.hash_set(
            &keys::counter_key(metric, subject),
            &keys::counter_field(metric, bucket),
            value,
        )
    }

    /// Apply a fold's deltas and mark its record seen, unless the record is
    /// already in the subject's ledger. Returns whether anything was counted.
    pub fn fold_once(&self, subject: &Subject, fold: &Fold) -> Result<bool, StoreError> {
        let ledger = DedupLedger::new(self.store, fold.ledger, subject);
        let increments: Vec<Increment> = fold
            .deltas
            .iter()
            .map(|delta| Increment {
                key: keys::counter_key(delta.metric, subject),
                field: keys::counter_field(delta.metric, &delta.bucket),
                amount: delta.amount,
            })
            .collect();
        self.store
            .commit_once(ledger.key(), &fold.record_id, &increments)
    }
}
