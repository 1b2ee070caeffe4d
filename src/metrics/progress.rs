//! Release progress: share of a fix-version's issues that are complete.

use crate::models::{Bucket, Issue, Metric};
use crate::store::Ledger;

use super::{Delta, Fold, Vocabulary};

/// One `Total` fold per (issue, fix-version) pair, and one `Complete` fold
/// per pair whose issue is in a complete status.
///
/// Both are keyed `<issue-id>:<version-id>` in separate ledgers, so an issue
/// is counted toward a release once, and counted complete once, no matter how
/// many runs observe it.
pub fn derive(issue: &Issue, vocabulary: &Vocabulary) -> Vec<Fold> {
    let complete = vocabulary.is_complete(&issue.status);
    let mut folds = Vec::new();
    for version in &issue.fix_versions {
        let record_id = format!("{}:{}", issue.id, version.id);
        let bucket = Bucket::label(&version.name);
        folds.push(Fold {
            ledger: Ledger::ProgressLogs,
            record_id: record_id.clone(),
            deltas: vec![Delta::new(Metric::ProgressTotal, bucket.clone(), 1.0)],
        });
        if complete {
            folds.push(Fold {
                ledger: Ledger::ProgressCompleteLogs,
                record_id,
                deltas: vec![Delta::new(Metric::ProgressComplete, bucket, 1.0)],
            });
        }
    }
    folds
}

/// `Complete * 100 / Total`, undefined for an empty release.
pub fn gauge(complete: f64, total: f64) -> Option<f64> {
    (total > 0.0).then(|| complete * 100.0 / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{issue, version};

    #[test]
    fn three_of_four_is_seventy_five_percent() {
        assert_eq!(gauge(3.0, 4.0), Some(75.0));
    }

    #[test]
    fn empty_release_has_no_progress() {
        assert_eq!(gauge(0.0, 0.0), None);
    }

    #[test]
    fn progress_keeps_fractions() {
        let value = gauge(1.0, 3.0).unwrap();
        assert!((value - 100.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn counts_each_version_of_a_complete_issue() {
        let mut issue = issue("7", "Delivered");
        issue.fix_versions = vec![version("100", "1.0"), version("101", "1.1")];

        let folds = derive(&issue, &Vocabulary::default());
        assert_eq!(folds.len(), 4);
        assert_eq!(folds[0].ledger, Ledger::ProgressLogs);
        assert_eq!(folds[0].record_id, "7:100");
        assert_eq!(folds[0].deltas, vec![Delta::new(Metric::ProgressTotal, Bucket::label("1.0"), 1.0)]);
        assert_eq!(folds[1].ledger, Ledger::ProgressCompleteLogs);
        assert_eq!(folds[1].deltas, vec![Delta::new(Metric::ProgressComplete, Bucket::label("1.0"), 1.0)]);
        assert_eq!(folds[3].record_id, "7:101");
    }

    #[test]
    fn incomplete_issues_only_count_toward_total() {
        let mut issue = issue("8", "Doing");
        issue.fix_versions = vec![version("100", "1.0")];

        let folds = derive(&issue, &Vocabulary::default());
        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].deltas[0].metric, Metric::ProgressTotal);
    }

    #[test]
    fn unscheduled_issues_contribute_nothing() {
        assert!(derive(&issue("9", "Accepted"), &Vocabulary::default()).is_empty());
    }
}
