mod handlers;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

/// Read-only access to persisted rollups.
pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Rosters
        .route("/developers", get(handlers::list_developers))
        .route("/teams", get(handlers::list_teams))
        .route("/projects", get(handlers::list_projects))
        // Rollups
        .route(
            "/stats/{metric}/{subject_type}/{subject}",
            get(handlers::get_stats),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
