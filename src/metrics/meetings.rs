//! Meeting time: minutes logged on meeting issues, per week of the worklog.

use crate::models::{Bucket, Metric, WeekKey, Worklog};
use crate::store::Ledger;

use super::{Delta, Fold};

/// One fold per worklog, keyed by the worklog id.
///
/// A worklog with no time still gets a fold (and so a ledger entry) but no
/// delta; accumulators only receive positive increments.
pub fn derive(worklog: &Worklog) -> Fold {
    let deltas = if worklog.time_spent_seconds > 0 {
        vec![Delta::new(
            Metric::MeetingMinutes,
            Bucket::from(WeekKey::of(&worklog.created)),
            worklog.time_spent_seconds as f64 / 60.0,
        )]
    } else {
        Vec::new()
    };

    Fold {
        ledger: Ledger::WorkLogs,
        record_id: worklog.id.clone(),
        deltas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn worklog(id: &str, seconds: i64, created: &str) -> Worklog {
        Worklog {
            id: id.to_string(),
            time_spent_seconds: seconds,
            created: DateTime::parse_from_rfc3339(created).unwrap(),
        }
    }

    #[test]
    fn converts_seconds_to_minutes_in_the_worklog_week() {
        let fold = derive(&worklog("10001", 5400, "2016-01-01T09:00:00+00:00"));
        assert_eq!(fold.ledger, Ledger::WorkLogs);
        assert_eq!(fold.record_id, "10001");
        assert_eq!(
            fold.deltas,
            vec![Delta::new(Metric::MeetingMinutes, WeekKey::new(53, 2015), 90.0)]
        );
    }

    #[test]
    fn keeps_fractional_minutes() {
        let fold = derive(&worklog("10002", 90, "2024-03-05T09:00:00+00:00"));
        assert_eq!(fold.deltas[0].amount, 1.5);
    }

    #[test]
    fn empty_worklogs_are_marked_but_add_nothing() {
        let fold = derive(&worklog("10003", 0, "2024-03-05T09:00:00+00:00"));
        assert!(fold.deltas.is_empty());
        assert_eq!(fold.record_id, "10003");
    }
}
