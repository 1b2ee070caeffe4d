use issue_rollup::db::Database;
use issue_rollup::metrics::{Delta, Fold};
use issue_rollup::models::*;
use issue_rollup::store::{keys, AggregateStore, DedupLedger, Increment, Ledger, Store};
use speculate2::speculate;

fn week(w: u32, y: i32) -> Bucket {
    Bucket::from(WeekKey::new(w, y))
}

fn velocity_fold(issue_id: &str, bucket: Bucket, seconds: f64) -> Fold {
    Fold {
        ledger: Ledger::VelocityLogs,
        record_id: issue_id.to_string(),
        deltas: vec![
            Delta::new(Metric::VelocityTotal, bucket.clone(), seconds),
            Delta::new(Metric::VelocityEntries, bucket, 1.0),
        ],
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "sets" {
        it "reports whether a member was newly added" {
            assert!(db.add_member("data:developers", "alice").expect("add failed"));
            assert!(!db.add_member("data:developers", "alice").expect("add failed"));
            assert!(db.is_member("data:developers", "alice").expect("query failed"));
            assert!(!db.is_member("data:developers", "bob").expect("query failed"));
        }

        it "lists members in order and keeps sets apart" {
            db.add_member("data:teams", "core").expect("add failed");
            db.add_member("data:developers", "bob").expect("add failed");
            db.add_member("data:developers", "alice").expect("add failed");

            assert_eq!(db.members("data:developers").expect("query failed"), vec!["alice", "bob"]);
            assert_eq!(db.members("data:teams").expect("query failed"), vec!["core"]);
            assert!(db.members("data:projects").expect("query failed").is_empty());
        }
    }

    describe "hashes" {
        it "returns None for a field never written" {
            assert_eq!(db.hash_get("stats:velocity:developer:alice", "10:2024").expect("query failed"), None);
        }

        it "increments atomically and returns the new value" {
            assert_eq!(db.hash_incr("k", "f", 3600.0).expect("incr failed"), 3600.0);
            assert_eq!(db.hash_incr("k", "f", 1800.0).expect("incr failed"), 5400.0);
            assert_eq!(db.hash_get("k", "f").expect("query failed"), Some(5400.0));
        }

        it "overwrites on set" {
            db.hash_incr("k", "f", 10.0).expect("incr failed");
            db.hash_set("k", "f", 2.5).expect("set failed");
            assert_eq!(db.hash_get("k", "f").expect("query failed"), Some(2.5));
        }

        it "lists all fields of one hash ordered by field" {
            db.hash_set("k", "b", 2.0).expect("set failed");
            db.hash_set("k", "a", 1.0).expect("set failed");
            db.hash_set("other", "c", 3.0).expect("set failed");

            assert_eq!(
                db.hash_get_all("k").expect("query failed"),
                vec![("a".to_string(), 1.0), ("b".to_string(), 2.0)]
            );
        }
    }

    describe "commit_once" {
        it "applies increments and marks the record" {
            let increments = vec![
                Increment { key: "k".to_string(), field: "a".to_string(), amount: 2.0 },
                Increment { key: "k".to_string(), field: "b".to_string(), amount: 3.0 },
            ];
            assert!(db.commit_once("ledger", "r1", &increments).expect("commit failed"));
            assert!(db.is_member("ledger", "r1").expect("query failed"));
            assert_eq!(db.hash_get("k", "a").expect("query failed"), Some(2.0));
            assert_eq!(db.hash_get("k", "b").expect("query failed"), Some(3.0));
        }

        it "skips a record already marked" {
            let increments = vec![Increment { key: "k".to_string(), field: "a".to_string(), amount: 2.0 }];
            db.commit_once("ledger", "r1", &increments).expect("commit failed");
            assert!(!db.commit_once("ledger", "r1", &increments).expect("commit failed"));
            assert_eq!(db.hash_get("k", "a").expect("query failed"), Some(2.0));
        }

        it "marks records without increments" {
            assert!(db.commit_once("ledger", "empty", &[]).expect("commit failed"));
            assert!(db.is_member("ledger", "empty").expect("query failed"));
        }
    }

    describe "dedup ledger" {
        it "is scoped per subject and record kind" {
            let alice = Subject::developer("alice");
            let bob = Subject::developer("bob");

            let ledger = DedupLedger::new(&db, Ledger::VelocityLogs, &alice);
            assert_eq!(ledger.key(), "data:velocityLogs:developer:alice");
            assert!(!ledger.seen("10001").expect("query failed"));

            ledger.mark_seen("10001").expect("mark failed");
            assert!(ledger.seen("10001").expect("query failed"));

            assert!(!DedupLedger::new(&db, Ledger::VelocityLogs, &bob).seen("10001").expect("query failed"));
            assert!(!DedupLedger::new(&db, Ledger::WorkLogs, &alice).seen("10001").expect("query failed"));
        }
    }

    describe "aggregate store" {
        it "reads absent counters as zero" {
            let aggregates = AggregateStore::new(&db);
            let value = aggregates
                .get(Metric::MeetingMinutes, &Subject::developer("alice"), &week(10, 2024))
                .expect("query failed");
            assert_eq!(value, 0.0);
        }

        it "writes counters and gauges under the documented keys" {
            let aggregates = AggregateStore::new(&db);
            let alice = Subject::developer("alice");
            let bucket = week(10, 2024);

            aggregates.increment(Metric::VelocityTotal, &alice, &bucket, 7200.0).expect("incr failed");
            aggregates.set_gauge(Metric::Velocity, &alice, &bucket, 60.0).expect("set failed");

            assert_eq!(db.hash_get("data:velocity:developer:alice", "10:2024:TOTAL").expect("query failed"), Some(7200.0));
            assert_eq!(db.hash_get("stats:velocity:developer:alice", "10:2024").expect("query failed"), Some(60.0));
        }

        it "folds a record once and leaves the second fold a no-op" {
            let aggregates = AggregateStore::new(&db);
            let alice = Subject::developer("alice");
            let fold = velocity_fold("10001", week(10, 2024), 3600.0);

            assert!(aggregates.fold_once(&alice, &fold).expect("fold failed"));
            assert!(!aggregates.fold_once(&alice, &fold).expect("fold failed"));

            assert_eq!(aggregates.get(Metric::VelocityTotal, &alice, &week(10, 2024)).expect("query failed"), 3600.0);
            assert_eq!(aggregates.get(Metric::VelocityEntries, &alice, &week(10, 2024)).expect("query failed"), 1.0);
            assert!(db.is_member("data:velocityLogs:developer:alice", "10001").expect("query failed"));
        }

        it "gives the same totals in either fold order" {
            let other = Database::open_memory().expect("Failed to create in-memory database");
            other.migrate().expect("Failed to run migrations");

            let alice = Subject::developer("alice");
            let a = velocity_fold("1", week(10, 2024), 3600.0);
            let b = velocity_fold("2", week(10, 2024), 1800.0);

            let forward = AggregateStore::new(&db);
            forward.fold_once(&alice, &a).expect("fold failed");
            forward.fold_once(&alice, &b).expect("fold failed");

            let backward = AggregateStore::new(&other);
            backward.fold_once(&alice, &b).expect("fold failed");
            backward.fold_once(&alice, &a).expect("fold failed");

            assert_eq!(
                db.hash_get_all("data:velocity:developer:alice").expect("query failed"),
                other.hash_get_all("data:velocity:developer:alice").expect("query failed")
            );
        }
    }

    describe "rosters" {
        it "uses the shared roster keys" {
            db.add_member(keys::TEAMS, "core").expect("add failed");
            db.add_member(&keys::team_members_key("core"), "alice").expect("add failed");

            assert_eq!(db.members("data:teams").expect("query failed"), vec!["core"]);
            assert_eq!(db.members("data:team:core:developers").expect("query failed"), vec!["alice"]);
        }
    }
}

#[test]
fn file_database_keeps_counters_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("rollup.db");

    {
        let db = Database::open(path.clone()).expect("Failed to open database");
        db.migrate().expect("Failed to run migrations");
        db.hash_incr("stats:meetings:developer:alice", "10:2024", 30.0).expect("incr failed");
        db.add_member("data:workLogs:developer:alice", "30001").expect("add failed");
    }

    let db = Database::open(path).expect("Failed to reopen database");
    db.migrate().expect("Migrations should be idempotent");
    assert_eq!(db.hash_get("stats:meetings:developer:alice", "10:2024").expect("query failed"), Some(30.0));
    assert!(db.is_member("data:workLogs:developer:alice", "30001").expect("query failed"));
}
