//! Domain models for issue-rollup.
//!
//! # Core Concepts
//!
//! ## Ephemeral Entities
//!
//! Fetched from the tracker on every run and discarded once their deltas are derived:
//!
//! - [`Issue`]: Snapshot of a tracker issue with its embedded change history.
//! - [`ChangeHistoryEntry`]: One changelog event, holding ordered [`FieldTransition`]s.
//! - [`Worklog`]: A time entry logged against an issue.
//!
//! ## Durable Entities
//!
//! Live in the shared store and are only ever created or grown by a run:
//!
//! - Counters addressed by ([`Metric`], [`Subject`], [`Bucket`]).
//! - Dedup records: "this record has been counted for this subject".
//!
//! ## Run Output
//!
//! - [`RunReport`]: Tally, observation tuples, failures and conditions of one pass.

mod bucket;
mod issue;
mod metric;
mod report;
mod subject;
mod week;

pub use bucket::*;
pub use issue::*;
pub use metric::*;
pub use report::*;
pub use subject::*;
pub use week::*;
