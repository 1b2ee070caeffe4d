use serde::{Deserialize, Serialize};

/// Field names and status strings the derivers match against.
///
/// Trackers are configured differently from team to team, so none of these
/// are hardcoded in the derivers. Defaults match a workflow of
/// `Doing → Finished → Delivered → Accepted | Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Changelog field carrying workflow transitions.
    pub status_field: String,
    /// Status whose arrival counts toward velocity.
    pub finished: String,
    /// Status whose arrival counts as a delivery (defect ratio) and which
    /// qualifies an issue for estimate accuracy.
    pub accepted: String,
    /// Status which, reached from `accepted`, counts as a defect.
    pub rejected: String,
    /// Statuses counted as complete for release progress.
    pub complete_statuses: Vec<String>,
    pub meeting_issue_type: String,
    /// Status meeting issues sit in while time is logged against them.
    pub meeting_status: String,
    /// Statuses of work in progress.
    pub active_statuses: Vec<String>,
    /// Statuses in which an estimable issue must already carry an estimate.
    pub estimate_statuses: Vec<String>,
    /// Statuses of work handed over for acceptance or already judged.
    pub delivered_statuses: Vec<String>,
    /// Issue types expected to carry an estimate.
    pub estimable_issue_types: Vec<String>,
    /// Fields whose edits are reported as recent changes.
    pub watched_fields: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            status_field: "status".to_string(),
            finished: "Finished".to_string(),
            accepted: "Accepted".to_string(),
            rejected: "Rejected".to_string(),
            complete_statuses: strings(&["Finished", "Accepted", "Delivered"]),
            meeting_issue_type: "Meeting".to_string(),
            meeting_status: "Doing".to_string(),
            active_statuses: strings(&["Doing", "Started"]),
            estimate_statuses: strings(&["Doing"]),
            delivered_statuses: strings(&["Accepted", "Delivered", "Rejected"]),
            estimable_issue_types: strings(&["Chore", "Bug", "Story"]),
            watched_fields: strings(&[
                "Can You Estimate?",
                "timeestimate",
                "description",
                "Acceptance Criteria",
            ]),
        }
    }
}

impl Vocabulary {
    pub fn is_complete(&self, status: &str) -> bool {
        contains(&self.complete_statuses, status)
    }

    pub fn is_active(&self, status: &str) -> bool {
        contains(&self.active_statuses, status)
    }

    pub fn is_delivered(&self, status: &str) -> bool {
        contains(&self.delivered_statuses, status)
    }

    pub fn is_estimable(&self, issue_type: &str) -> bool {
        contains(&self.estimable_issue_types, issue_type)
    }

    /// Whether an issue of this type, in this status, should have an estimate by now.
    pub fn expects_estimate(&self, status: &str, issue_type: &str) -> bool {
        contains(&self.estimate_statuses, status) && self.is_estimable(issue_type)
    }

    pub fn is_watched(&self, field: &str) -> bool {
        contains(&self.watched_fields, field)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn contains(values: &[String], value: &str) -> bool {
    values.iter().any(|v| v == value)
}
