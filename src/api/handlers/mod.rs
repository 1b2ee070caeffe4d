use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::db::Database;
use crate::models::{Subject, SubjectKind};
use crate::store::{keys, Store, StoreError};

// ============================================================
// Error Handling
// ============================================================

/// Log the store error server-side and hand the client a generic message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn bad_request(msg: String) -> (StatusCode, String) {
    tracing::warn!("Bad request: {}", msg);
    (StatusCode::BAD_REQUEST, msg)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Rosters
// ============================================================

#[derive(Debug, Serialize)]
pub struct TeamSummary {
    pub name: String,
    pub members: Vec<String>,
}

pub async fn list_developers(
    State(db): State<Database>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    db.members(keys::DEVELOPERS).map(Json).map_err(internal_error)
}

pub async fn list_teams(
    State(db): State<Database>,
) -> Result<Json<Vec<TeamSummary>>, (StatusCode, String)> {
    let names = db.members(keys::TEAMS).map_err(internal_error)?;
    let teams = names
        .into_iter()
        .map(|name| -> Result<TeamSummary, StoreError> {
            let members = db.members(&keys::team_members_key(&name))?;
            Ok(TeamSummary { name, members })
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(internal_error)?;
    Ok(Json(teams))
}

pub async fn list_projects(
    State(db): State<Database>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    db.members(keys::PROJECTS).map(Json).map_err(internal_error)
}

// ============================================================
// Rollups
// ============================================================

/// Every field of one rollup hash, e.g. `{"10:2024": 60.0}` for a
/// developer's weekly velocity.
pub async fn get_stats(
    State(db): State<Database>,
    Path((metric, subject_type, subject)): Path<(String, String, String)>,
) -> Result<Json<BTreeMap<String, f64>>, (StatusCode, String)> {
    let metric = keys::stats_metric(&metric)
        .ok_or_else(|| {
            bad_request(format!(
                "Unknown metric: {} (expected one of {})",
                metric,
                keys::STATS_METRICS.join(", ")
            ))
        })?;
    let kind = SubjectKind::from_str(&subject_type)
        .ok_or_else(|| bad_request(format!("Unknown subject type: {}", subject_type)))?;

    let subject = Subject { kind, id: subject };
    let fields = db
        .hash_get_all(&keys::counter_key(metric, &subject))
        .map_err(internal_error)?;

    if fields.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No {} rollup for {}", metric.as_str(), subject),
        ));
    }
    Ok(Json(fields.into_iter().collect()))
}
