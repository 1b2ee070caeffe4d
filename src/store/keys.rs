//! Key namespacing: `<category>:<metric-or-list>:<subject-type>:<subject>`,
//! with hash fields `<week>:<year>[:<suffix>]` or `<label>[:<suffix>]`.

use crate::models::{Bucket, Metric, Subject};

use super::Ledger;

pub const DEVELOPERS: &str = "data:developers";
pub const TEAMS: &str = "data:teams";
pub const PROJECTS: &str = "data:projects";

/// Names accepted by [`stats_metric`], i.e. everything kept under `stats:`.
pub const STATS_METRICS: [&str; 5] = [
    "velocity",
    "meetings",
    "defectRatio",
    "estimateAccuracy",
    "progress",
];

fn layout(metric: Metric) -> (&'static str, &'static str, Option<&'static str>) {
    match metric {
        Metric::VelocityTotal => ("data", "velocity", Some("TOTAL")),
        Metric::VelocityEntries => ("data", "velocity", Some("ENTRIES")),
        Metric::Velocity => ("stats", "velocity", None),
        Metric::MeetingMinutes => ("stats", "meetings", None),
        Metric::DefectRatio => ("stats", "defectRatio", None),
        Metric::EstimateAccuracy => ("stats", "estimateAccuracy", None),
        Metric::ProgressTotal => ("data", "progress", Some("Total")),
        Metric::ProgressComplete => ("data", "progress", Some("Complete")),
        Metric::Progress => ("stats", "progress", None),
    }
}

pub fn counter_key(metric: Metric, subject: &Subject) -> String {
    let (category, name, _) = layout(metric);
    format!("{}:{}:{}:{}", category, name, subject.kind.as_str(), subject.id)
}

pub fn counter_field(metric: Metric, bucket: &Bucket) -> String {
    match layout(metric).2 {
        Some(suffix) => format!("{}:{}", bucket, suffix),
        None => bucket.to_string(),
    }
}

pub fn ledger_key(ledger: Ledger, subject: &Subject) -> String {
    format!("data:{}:{}:{}", ledger.as_str(), subject.kind.as_str(), subject.id)
}

pub fn team_members_key(team: &str) -> String {
    format!("data:team:{}:developers", team)
}

/// The metric stored under `stats:<name>:...`.
pub fn stats_metric(name: &str) -> Option<Metric> {
    match name {
        "velocity" => Some(Metric::Velocity),
        "meetings" => Some(Metric::MeetingMinutes),
        "defectRatio" => Some(Metric::DefectRatio),
        "estimateAccuracy" => Some(Metric::EstimateAccuracy),
        "progress" => Some(Metric::Progress),
        _ => None,
    }
}
