//! Test utilities for database setup.
//!
//! Reuses the authoritative `init_db`/migration path so tests never carry a
//! schema of their own.

use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::cell::Cell;
use std::sync::MutexGuard;
use tempfile::TempDir;

use crate::adaptive::AdaptiveEngine;
use crate::db::{self, init_db};
use crate::domain::{AttemptRecord, Subject, Subtopic};
use crate::store::SqliteStore;

/// Temporary on-disk database plus a store scoped to the `maths` subject.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub store: SqliteStore,
    /// Monotonic clock for seeded attempts so history order is deterministic
    tick: Cell<i64>,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let pool = init_db(&temp.path().join("adaptive.db"))?;
        let subject = Subject::new("maths").expect("valid subject");

        Ok(Self {
            temp,
            store: SqliteStore::new(pool, subject),
            tick: Cell::new(0),
        })
    }

    pub fn engine(&self) -> AdaptiveEngine<SqliteStore> {
        AdaptiveEngine::new(self.store.clone())
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        db::try_lock(self.store.pool()).expect("test database lock")
    }

    /// Seed a raw attempt without touching progress rows
    pub fn add_attempt(
        &self,
        user_id: &str,
        subtopic_id: i64,
        question_id: i64,
        question_type_id: i64,
        is_correct: bool,
    ) {
        let tick = self.tick.get() + 1;
        self.tick.set(tick);

        let attempt = AttemptRecord {
            question_id,
            subtopic_id,
            question_type_id,
            is_correct,
            attempted_at: Utc::now() - Duration::hours(1) + Duration::seconds(tick),
        };
        db::insert_attempt(&self.conn(), self.store.subject(), user_id, &attempt)
            .expect("seed attempt");
    }

    pub fn add_subtopic(&self, id: i64, topic_id: i64, name: &str, position: i64) {
        let subtopic = Subtopic {
            id,
            topic_id,
            name: name.to_string(),
            position,
        };
        db::insert_subtopic(&self.conn(), self.store.subject(), &subtopic).expect("seed subtopic");
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        self.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .expect("count rows")
    }

    pub fn execute(&self, sql: &str) {
        self.conn().execute_batch(sql).expect("execute sql");
    }
}
