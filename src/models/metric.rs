use serde::{Deserialize, Serialize};

/// A named counter kept per subject and bucket.
///
/// Accumulators only ever grow through positive increments. Gauges are
/// overwritten with a value derived from accumulators (or from a fresh
/// snapshot) on every run that touches their bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Seconds spent on issues finished in the week.
    VelocityTotal,
    /// Number of finish transitions counted in the week.
    VelocityEntries,
    /// `(TOTAL / ENTRIES) / 60`.
    Velocity,
    MeetingMinutes,
    /// `rejected / delivered`.
    DefectRatio,
    /// Per-issue accuracy percentage of the original estimate.
    EstimateAccuracy,
    ProgressTotal,
    ProgressComplete,
    /// `Complete * 100 / Total`.
    Progress,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VelocityTotal => "velocityTotal",
            Self::VelocityEntries => "velocityEntries",
            Self::Velocity => "velocity",
            Self::MeetingMinutes => "meetingMinutes",
            Self::DefectRatio => "defectRatio",
            Self::EstimateAccuracy => "estimateAccuracy",
            Self::ProgressTotal => "progressTotal",
            Self::ProgressComplete => "progressComplete",
            Self::Progress => "progress",
        }
    }

    pub fn is_gauge(&self) -> bool {
        matches!(
            self,
            Self::Velocity | Self::DefectRatio | Self::EstimateAccuracy | Self::Progress
        )
    }
}
