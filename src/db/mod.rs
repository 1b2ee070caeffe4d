//! SQLite-backed [`Store`].
//!
//! Sets live in `set_members`, hashes in `hash_fields`. A single connection
//! behind a mutex serializes access, which gives every primitive per-key
//! atomicity for free; `commit_once` additionally runs in one transaction.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::store::{Increment, Store, StoreError};

const INCR_SQL: &str = "INSERT INTO hash_fields (hash_key, field, value, updated_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(hash_key, field)
     DO UPDATE SET value = value + excluded.value, updated_at = excluded.updated_at
     RETURNING value";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "issue-rollup")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("rollup.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))
    }
}

fn is_member(conn: &Connection, set: &str, member: &str) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM set_members WHERE set_key = ? AND member = ?",
            (set, member),
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn add_member(conn: &Connection, set: &str, member: &str) -> Result<bool, StoreError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO set_members (set_key, member, added_at) VALUES (?, ?, ?)",
        (set, member, Utc::now().to_rfc3339()),
    )?;
    Ok(inserted == 1)
}

fn hash_incr(conn: &Connection, key: &str, field: &str, amount: f64) -> Result<f64, StoreError> {
    let value = conn.query_row(
        INCR_SQL,
        (key, field, amount, Utc::now().to_rfc3339()),
        |row| row.get(0),
    )?;
    Ok(value)
}

impl Store for Database {
    fn is_member(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        is_member(&conn, set, member)
    }

    fn add_member(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        add_member(&conn, set, member)
    }

    fn members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT member FROM set_members WHERE set_key = ? ORDER BY member")?;
        let members = stmt
            .query_map([set], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(members)
    }

    fn hash_get(&self, key: &str, field: &str) -> Result<Option<f64>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM hash_fields WHERE hash_key = ? AND field = ?",
                (key, field),
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn hash_incr(&self, key: &str, field: &str, amount: f64) -> Result<f64, StoreError> {
        let conn = self.lock()?;
        hash_incr(&conn, key, field, amount)
    }

    fn hash_set(&self, key: &str, field: &str, value: f64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO hash_fields (hash_key, field, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(hash_key, field)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, field, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    fn hash_get_all(&self, key: &str) -> Result<Vec<(String, f64)>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT field, value FROM hash_fields WHERE hash_key = ? ORDER BY field")?;
        let fields = stmt
            .query_map([key], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, f64)>, _>>()?;
        Ok(fields)
    }

    fn commit_once(
        &self,
        set: &str,
        member: &str,
        increments: &[Increment],
    ) -> Result<bool, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if is_member(&tx, set, member)? {
            return Ok(false);
        }
        for increment in increments {
            hash_incr(&tx, &increment.key, &increment.field, increment.amount)?;
        }
        add_member(&tx, set, member)?;

        tx.commit()?;
        Ok(true)
    }
}
