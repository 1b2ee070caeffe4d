use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Bucket, Metric, Subject, SubjectKind};

/// The report selected for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Velocity,
    DefectRatio,
    Meetings,
    EstimateAccuracy,
    Progress,
    RedFlags,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        Self::Velocity,
        Self::DefectRatio,
        Self::Meetings,
        Self::EstimateAccuracy,
        Self::Progress,
        Self::RedFlags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::DefectRatio => "defectRatio",
            Self::Meetings => "meetings",
            Self::EstimateAccuracy => "estimateAccuracy",
            Self::Progress => "progress",
            Self::RedFlags => "redFlags",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Which rosters the report fans out over. Red flags check developers'
    /// own issues and, per project, recent edits of anyone's work.
    pub fn subject_kinds(&self) -> &'static [SubjectKind] {
        match self {
            Self::Progress => &[SubjectKind::Project],
            Self::RedFlags => &[SubjectKind::Developer, SubjectKind::Project],
            _ => &[SubjectKind::Developer],
        }
    }
}

/// One value produced by a run: `(subject, metric, bucket, value)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub subject: Subject,
    pub metric: Metric,
    pub bucket: Bucket,
    pub value: f64,
}

/// A subject whose pass was abandoned.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectFailure {
    pub subject: Subject,
    pub report: ReportKind,
    pub error: String,
}

/// A gauge that was not written because its denominator was zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndefinedRatio {
    pub subject: Subject,
    pub metric: Metric,
    pub bucket: Bucket,
}

/// Kinds of hygiene problems the red-flag report looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RedFlag {
    /// Active work item without an original estimate.
    MissingEstimate,
    /// Delivered item with no time logged and no subtasks to carry it.
    NoTimeLogged,
    /// Active or delivered item not scheduled for any release.
    NoFixVersion,
    /// A watched field was edited within the last day.
    RecentEdit,
}

/// A red flag raised against one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub subject: Subject,
    pub issue_key: String,
    pub flag: RedFlag,
    pub detail: String,
}

/// The outcome of one aggregation pass.
///
/// There is no rollback: counters written by a subject that later failed stay
/// in the store, which is safe because every record commits together with
/// its dedup mark.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub report: ReportKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: usize,
    pub failed: usize,
    pub observations: Vec<Observation>,
    pub failures: Vec<SubjectFailure>,
    pub undefined_ratios: Vec<UndefinedRatio>,
    pub findings: Vec<Finding>,
}

impl RunReport {
    /// Observations for one subject and metric, in bucket order.
    pub fn values_for(&self, subject: &Subject, metric: Metric) -> Vec<(&Bucket, f64)> {
        let mut values: Vec<_> = self
            .observations
            .iter()
            .filter(|o| &o.subject == subject && o.metric == metric)
            .map(|o| (&o.bucket, o.value))
            .collect();
        values.sort_by(|a, b| a.0.cmp(b.0));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_kinds_round_trip_through_their_names() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ReportKind::from_str("noSuchReport"), None);
    }

    #[test]
    fn report_names_match_serde_names() {
        for kind in ReportKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn reports_fan_out_over_their_rosters() {
        assert_eq!(ReportKind::Progress.subject_kinds(), &[SubjectKind::Project]);
        assert_eq!(ReportKind::Velocity.subject_kinds(), &[SubjectKind::Developer]);
        assert_eq!(
            ReportKind::RedFlags.subject_kinds(),
            &[SubjectKind::Developer, SubjectKind::Project]
        );
    }
}
