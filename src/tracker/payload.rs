//! Wire shapes of the tracker's REST responses and their conversion into
//! domain models.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use super::SourceError;
use crate::models::{ChangeHistoryEntry, FieldTransition, FixVersion, Issue, Worklog};

/// Tracker timestamps look like `2024-03-05T10:15:30.000+0000`; RFC 3339 is
/// accepted as well.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
}

fn timestamp(s: &str, context: &str) -> Result<DateTime<FixedOffset>, SourceError> {
    parse_timestamp(s)
        .ok_or_else(|| SourceError::MalformedPayload(format!("{}: bad timestamp {:?}", context, s)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<IssuePayload>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub id: String,
    pub key: String,
    pub fields: FieldsPayload,
    #[serde(default)]
    pub changelog: Option<ChangelogPayload>,
}

#[derive(Debug, Deserialize)]
pub struct FieldsPayload {
    #[serde(default)]
    pub status: Option<NamedPayload>,
    #[serde(default)]
    pub issuetype: Option<NamedPayload>,
    #[serde(default)]
    pub timespent: Option<i64>,
    #[serde(default)]
    pub timeoriginalestimate: Option<i64>,
    #[serde(default, rename = "fixVersions")]
    pub fix_versions: Vec<FixVersionPayload>,
    #[serde(default)]
    pub subtasks: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct NamedPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FixVersionPayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub released: bool,
}

/// The changelog embedded by `expand=changelog`. Long histories are cut
/// off; `total` says how many entries the issue really has.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogPayload {
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub histories: Vec<HistoryPayload>,
}

impl ChangelogPayload {
    /// Number of entries the tracker left out, if any.
    pub fn missing(&self) -> u32 {
        self.total
            .map_or(0, |total| total.saturating_sub(self.histories.len() as u32))
    }
}

/// A page of `issue/{key}/changelog`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogPage {
    #[serde(default)]
    pub values: Vec<HistoryPayload>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryPayload {
    pub created: String,
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub field: String,
    #[serde(default)]
    pub from_string: Option<String>,
    #[serde(default)]
    pub to_string: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPage {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub worklogs: Vec<WorklogPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPayload {
    pub id: String,
    #[serde(default)]
    pub time_spent_seconds: i64,
    pub created: String,
}

impl IssuePayload {
    pub fn into_issue(self) -> Result<Issue, SourceError> {
        let context = format!("issue {}", self.key);
        let history = self
            .changelog
            .map(|c| c.histories)
            .unwrap_or_default()
            .into_iter()
            .map(|h| -> Result<ChangeHistoryEntry, SourceError> {
                Ok(ChangeHistoryEntry {
                    created: timestamp(&h.created, &context)?,
                    items: h
                        .items
                        .into_iter()
                        .map(|i| FieldTransition {
                            field: i.field,
                            from: i.from_string,
                            to: i.to_string,
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fields = self.fields;
        Ok(Issue {
            id: self.id,
            key: self.key,
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            issue_type: fields.issuetype.map(|t| t.name).unwrap_or_default(),
            time_spent: fields.timespent.unwrap_or(0),
            original_estimate: fields.timeoriginalestimate.unwrap_or(0),
            fix_versions: fields
                .fix_versions
                .into_iter()
                .map(|v| FixVersion {
                    id: v.id,
                    name: v.name,
                    released: v.released,
                })
                .collect(),
            subtask_count: fields.subtasks.len(),
            history,
        })
    }
}

impl WorklogPayload {
    pub fn into_worklog(self) -> Result<Worklog, SourceError> {
        let created = timestamp(&self.created, &format!("worklog {}", self.id))?;
        Ok(Worklog {
            id: self.id,
            time_spent_seconds: self.time_spent_seconds,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeekKey;

    const ISSUE: &str = r#"{
        "id": "10042",
        "key": "CORE-42",
        "fields": {
            "status": { "name": "Finished" },
            "issuetype": { "name": "Story" },
            "timespent": 3600,
            "timeoriginalestimate": null,
            "fixVersions": [ { "id": "200", "name": "1.0", "released": true, "self": "http://x" } ],
            "subtasks": [ { "id": "10043" } ],
            "updated": "2024-03-05T10:00:00.000+0000"
        },
        "changelog": {
            "histories": [
                {
                    "created": "2024-03-05T10:15:30.000+0000",
                    "items": [
                        { "field": "status", "fromString": "Doing", "toString": "Finished" },
                        { "field": "resolution", "fromString": null, "toString": "Done" }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn parses_tracker_and_rfc3339_timestamps() {
        let tracker = parse_timestamp("2024-03-05T10:15:30.000+0000").unwrap();
        let rfc = parse_timestamp("2024-03-05T10:15:30Z").unwrap();
        assert_eq!(tracker, rfc);
        assert_eq!(
            parse_timestamp("2015-12-31T23:30:00.000-0500").map(|t| WeekKey::of(&t)),
            Some(WeekKey::new(53, 2015))
        );
        assert!(parse_timestamp("2024-03-05").is_none());
    }

    #[test]
    fn converts_an_issue_with_changelog() {
        let payload: IssuePayload = serde_json::from_str(ISSUE).unwrap();
        let issue = payload.into_issue().unwrap();

        assert_eq!(issue.id, "10042");
        assert_eq!(issue.key, "CORE-42");
        assert_eq!(issue.status, "Finished");
        assert_eq!(issue.issue_type, "Story");
        assert_eq!(issue.time_spent, 3600);
        assert_eq!(issue.original_estimate, 0);
        assert_eq!(issue.subtask_count, 1);
        assert_eq!(
            issue.fix_versions,
            vec![FixVersion {
                id: "200".to_string(),
                name: "1.0".to_string(),
                released: true
            }]
        );
        assert_eq!(issue.history.len(), 1);
        assert_eq!(issue.history[0].items.len(), 2);
        assert!(issue.history[0].items[0].goes_to("Finished"));
        assert_eq!(issue.history[0].items[1].from, None);
    }

    #[test]
    fn issue_without_changelog_has_empty_history() {
        let payload: IssuePayload =
            serde_json::from_str(r#"{ "id": "1", "key": "A-1", "fields": {} }"#).unwrap();
        let issue = payload.into_issue().unwrap();
        assert!(issue.history.is_empty());
        assert_eq!(issue.status, "");
    }

    #[test]
    fn bad_history_timestamp_is_malformed() {
        let payload: IssuePayload = serde_json::from_str(
            r#"{ "id": "1", "key": "A-1", "fields": {},
                 "changelog": { "histories": [ { "created": "yesterday", "items": [] } ] } }"#,
        )
        .unwrap();
        let err = payload.into_issue().unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(ref m) if m.contains("A-1")));
    }

    #[test]
    fn embedded_changelog_reports_left_out_entries() {
        let payload: IssuePayload = serde_json::from_str(
            r#"{ "id": "1", "key": "A-1", "fields": {},
                 "changelog": { "startAt": 0, "maxResults": 1, "total": 150, "histories": [
                     { "created": "2024-03-05T10:15:30.000+0000", "items": [] }
                 ] } }"#,
        )
        .unwrap();
        assert_eq!(payload.changelog.as_ref().map(|c| c.missing()), Some(149));

        let complete: IssuePayload = serde_json::from_str(ISSUE).unwrap();
        assert_eq!(complete.changelog.as_ref().map(|c| c.missing()), Some(0));
    }

    #[test]
    fn converts_worklogs() {
        let page: WorklogPage = serde_json::from_str(
            r#"{ "startAt": 0, "maxResults": 20, "total": 1, "worklogs": [
                { "id": "30001", "timeSpentSeconds": 1800, "created": "2024-03-05T09:00:00.000+0000" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(page.total, 1);
        let worklog = page.worklogs.into_iter().next().unwrap().into_worklog().unwrap();
        assert_eq!(worklog.id, "30001");
        assert_eq!(worklog.time_spent_seconds, 1800);
    }
}
