// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool setup, pragmas, and schema migration.

use crate::error::StoreError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// How long a contended writer waits before SQLITE_BUSY surfaces.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// WAL pages between automatic checkpoints.
const WAL_AUTOCHECKPOINT: &str = "1000";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS executions (
    execution_id        TEXT PRIMARY KEY,
    agent_id            TEXT NOT NULL,
    status              TEXT NOT NULL DEFAULT 'PENDING',
    parent_execution_id TEXT,
    payload             TEXT NOT NULL,
    final_result        TEXT,
    base_priority       INTEGER NOT NULL,
    priority            INTEGER NOT NULL,
    enqueue_ts_ms       INTEGER NOT NULL,
    lease_id            TEXT,
    lease_expires_at_ms INTEGER,
    created_at_ms       INTEGER NOT NULL,
    started_at_ms       INTEGER,
    completed_at_ms     INTEGER,
    error_log           TEXT
);

CREATE INDEX IF NOT EXISTS idx_executions_dispatch
    ON executions (status, priority DESC, enqueue_ts_ms ASC);

CREATE TABLE IF NOT EXISTS inference_queue (
    task_id             TEXT PRIMARY KEY,
    model_id            TEXT NOT NULL,
    status              TEXT NOT NULL DEFAULT 'PENDING',
    prompt              TEXT NOT NULL,
    parameters          TEXT NOT NULL,
    result              TEXT,
    base_priority       INTEGER NOT NULL,
    priority            INTEGER NOT NULL,
    enqueue_ts_ms       INTEGER NOT NULL,
    lease_id            TEXT,
    lease_expires_at_ms INTEGER,
    created_at_ms       INTEGER NOT NULL,
    started_at_ms       INTEGER,
    completed_at_ms     INTEGER,
    tokens_per_second   REAL,
    error_log           TEXT
);

CREATE INDEX IF NOT EXISTS idx_inference_dispatch
    ON inference_queue (status, priority DESC, enqueue_ts_ms ASC);

CREATE TABLE IF NOT EXISTS node_events (
    event_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    execution_id        TEXT NOT NULL REFERENCES executions(execution_id),
    node_id             TEXT NOT NULL,
    status              TEXT NOT NULL,
    intermediate_output TEXT,
    started_at_ms       INTEGER,
    completed_at_ms     INTEGER,
    error_log           TEXT
);

CREATE INDEX IF NOT EXISTS idx_node_events_execution
    ON node_events (execution_id, event_id);
"#;

/// Handle to the queue database. Cheap to clone; all clones share one
/// connection pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database file and run migrations.
    ///
    /// WAL mode with a busy timeout lets the workers, the HTTP handlers,
    /// and the aging loop write concurrently; `synchronous=NORMAL`
    /// trades strict durability for throughput, which is safe because
    /// startup recovery repairs in-flight state after a crash.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .pragma("wal_autocheckpoint", WAL_AUTOCHECKPOINT)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    ///
    /// Capped at one connection: each in-memory connection is its own
    /// database.
    pub async fn memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Version string of the linked SQLite library.
    pub async fn sqlite_version(&self) -> Result<String, StoreError> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    /// Force a WAL checkpoint. Called on shutdown so the log does not
    /// grow unbounded across restarts.
    pub async fn checkpoint(&self) -> Result<(), StoreError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Close the pool, flushing outstanding writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
