//! Velocity: time spent on issues, per week they reached the finished status.

use crate::models::{Bucket, Issue, Metric, WeekKey};
use crate::store::Ledger;

use super::{Delta, Fold, Vocabulary};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// For every transition of the status field into `finished`, add the issue's
/// time spent to `TOTAL` and one to `ENTRIES` in the week of that transition.
///
/// Issues without logged time, or without a qualifying transition, produce
/// no fold and so are never marked seen: they are looked at again next run.
pub fn derive(issue: &Issue, vocabulary: &Vocabulary) -> Option<Fold> {
    if issue.time_spent <= 0 {
        return None;
    }

    let time_spent = issue.time_spent as f64;
    let deltas: Vec<Delta> = issue
        .transitions()
        .filter(|(_, t)| t.is(&vocabulary.status_field) && t.goes_to(&vocabulary.finished))
        .flat_map(|(entry, _)| {
            let week = Bucket::from(WeekKey::of(&entry.created));
            [
                Delta::new(Metric::VelocityTotal, week.clone(), time_spent),
                Delta::new(Metric::VelocityEntries, week, 1.0),
            ]
        })
        .collect();

    if deltas.is_empty() {
        return None;
    }

    Some(Fold {
        ledger: Ledger::VelocityLogs,
        record_id: issue.id.clone(),
        deltas,
    })
}

/// `(TOTAL / ENTRIES) / 60`, undefined without entries.
pub fn gauge(total: f64, entries: f64) -> Option<f64> {
    (entries > 0.0).then(|| total / entries / SECONDS_PER_MINUTE)
}
