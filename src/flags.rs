//! Red-flag checks: issues whose bookkeeping needs attention.
//!
//! Findings are only reported; delivering them (email, chat) is left to
//! whoever consumes the run report.

use chrono::{DateTime, Duration, Utc};

use crate::metrics::Vocabulary;
use crate::models::{Finding, Issue, RedFlag, Subject};

/// How far back an edit of a watched field counts as recent.
const RECENT_EDIT_WINDOW_HOURS: i64 = 24;

fn finding(issue: &Issue, subject: &Subject, flag: RedFlag, detail: String) -> Finding {
    Finding {
        subject: subject.clone(),
        issue_key: issue.key.clone(),
        flag,
        detail,
    }
}

/// Bookkeeping checks on one of a developer's issues.
pub fn inspect(issue: &Issue, subject: &Subject, vocabulary: &Vocabulary) -> Vec<Finding> {
    let mut findings = Vec::new();
    let active = vocabulary.is_active(&issue.status);
    let delivered = vocabulary.is_delivered(&issue.status);

    if vocabulary.expects_estimate(&issue.status, &issue.issue_type) && issue.original_estimate <= 0 {
        findings.push(finding(
            issue,
            subject,
            RedFlag::MissingEstimate,
            format!("{} in {} has no original estimate", issue.issue_type, issue.status),
        ));
    }

    if delivered && issue.time_spent <= 0 && issue.subtask_count == 0 {
        findings.push(finding(
            issue,
            subject,
            RedFlag::NoTimeLogged,
            format!("{} without any time logged", issue.status),
        ));
    }

    if (active || delivered) && issue.fix_versions.is_empty() {
        findings.push(finding(
            issue,
            subject,
            RedFlag::NoFixVersion,
            format!("{} without a fix version", issue.status),
        ));
    }

    findings
}

/// Watched fields of an active issue edited within the last day. Run over a
/// project's issues, so unassigned work is covered too.
pub fn recent_edits(
    issue: &Issue,
    subject: &Subject,
    vocabulary: &Vocabulary,
    now: DateTime<Utc>,
) -> Vec<Finding> {
    if !vocabulary.is_active(&issue.status) {
        return Vec::new();
    }

    let window = Duration::hours(RECENT_EDIT_WINDOW_HOURS);
    issue
        .transitions()
        .filter(|(_, t)| vocabulary.is_watched(&t.field))
        .filter(|(entry, _)| {
            let age = now.signed_duration_since(entry.created);
            age >= Duration::zero() && age < window
        })
        .map(|(entry, t)| {
            finding(
                issue,
                subject,
                RedFlag::RecentEdit,
                format!("{} changed at {}", t.field, entry.created.to_rfc3339()),
            )
        })
        .collect()
}
