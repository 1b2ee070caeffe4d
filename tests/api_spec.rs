use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum_test::TestServer;
use issue_rollup::api::create_router;
use issue_rollup::db::Database;
use issue_rollup::store::Store;
use serde_json::Value;

fn setup() -> (TestServer, Database) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db.clone());
    (TestServer::new(app).expect("Failed to create test server"), db)
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _db) = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }
}

mod rosters {
    use super::*;

    #[tokio::test]
    async fn lists_developers_and_projects() {
        let (server, db) = setup();
        db.add_member("data:developers", "bob").unwrap();
        db.add_member("data:developers", "alice").unwrap();
        db.add_member("data:projects", "CORE").unwrap();

        let developers: Vec<String> = server.get("/api/v1/developers").await.json();
        assert_eq!(developers, vec!["alice", "bob"]);

        let projects: Vec<String> = server.get("/api/v1/projects").await.json();
        assert_eq!(projects, vec!["CORE"]);
    }

    #[tokio::test]
    async fn lists_teams_with_members() {
        let (server, db) = setup();
        db.add_member("data:teams", "core").unwrap();
        db.add_member("data:team:core:developers", "alice").unwrap();

        let response = server.get("/api/v1/teams").await;

        response.assert_status_ok();
        let teams: Value = response.json();
        assert_eq!(teams[0]["name"], "core");
        assert_eq!(teams[0]["members"][0], "alice");
    }

    #[tokio::test]
    async fn empty_rosters_are_empty_lists() {
        let (server, _db) = setup();

        let developers: Vec<String> = server.get("/api/v1/developers").await.json();
        assert!(developers.is_empty());
    }
}

mod stats {
    use super::*;

    #[tokio::test]
    async fn returns_every_field_of_a_rollup() {
        let (server, db) = setup();
        db.hash_set("stats:velocity:developer:alice", "10:2024", 60.0).unwrap();
        db.hash_set("stats:velocity:developer:alice", "11:2024", 45.5).unwrap();

        let response = server.get("/api/v1/stats/velocity/developer/alice").await;

        response.assert_status_ok();
        let fields: BTreeMap<String, f64> = response.json();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["10:2024"], 60.0);
        assert_eq!(fields["11:2024"], 45.5);
    }

    #[tokio::test]
    async fn reads_team_and_project_rollups() {
        let (server, db) = setup();
        db.hash_set("stats:defectRatio:team:core", "10:2024", 0.25).unwrap();
        db.hash_set("stats:progress:project:CORE", "1.0", 75.0).unwrap();

        let ratio: BTreeMap<String, f64> = server.get("/api/v1/stats/defectRatio/team/core").await.json();
        assert_eq!(ratio["10:2024"], 0.25);

        let progress: BTreeMap<String, f64> = server.get("/api/v1/stats/progress/project/CORE").await.json();
        assert_eq!(progress["1.0"], 75.0);
    }

    #[tokio::test]
    async fn missing_rollup_is_not_found() {
        let (server, _db) = setup();

        let response = server
            .get("/api/v1/stats/meetings/developer/nobody")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_metric_is_bad_request() {
        let (server, _db) = setup();

        let response = server
            .get("/api/v1/stats/happiness/developer/alice")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("happiness"));
    }

    #[tokio::test]
    async fn unknown_subject_type_is_bad_request() {
        let (server, _db) = setup();

        let response = server
            .get("/api/v1/stats/velocity/planet/mars")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn accumulators_are_not_exposed_as_stats() {
        let (server, db) = setup();
        db.hash_incr("data:velocity:developer:alice", "10:2024:TOTAL", 3600.0).unwrap();

        let response = server
            .get("/api/v1/stats/velocity/developer/alice")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
