//! SQLite-backed execution state.
//!
//! One row per (date, task), upserted on every attempt. This is the
//! idempotency guard: a recorded success means the action is never
//! attempted again for that date, across process restarts. Rows are
//! never deleted automatically. No cross-process locking is provided;
//! overlapping invocations for the same date are an unhandled hazard.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use ponto_core::error::{PontoError, Result};
use ponto_core::types::{ActionRecord, ActionStatus, ExecutionState, TaskKind};

/// Durable per-date record of which tasks already ran and how it went.
pub struct ExecutionStateStore {
    conn: rusqlite::Connection,
}

impl ExecutionStateStore {
    /// Open or create the execution state database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| PontoError::Storage(format!("DB open: {e}")))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| PontoError::Storage(format!("DB open: {e}")))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS execution_state (
                date TEXT NOT NULL,              -- YYYY-MM-DD
                task TEXT NOT NULL,              -- 'entry', 'exit', 'sync'
                status TEXT NOT NULL,            -- 'success', 'failed'
                timestamp TEXT NOT NULL,         -- RFC3339
                details TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (date, task)
            );
         ",
            )
            .map_err(|e| PontoError::Storage(format!("Migration: {e}")))?;
        Ok(())
    }

    /// Record the outcome of a task attempt. Upsert: a later attempt
    /// overwrites an earlier record for the same (date, task).
    pub fn record(
        &self,
        date: NaiveDate,
        task: TaskKind,
        status: ActionStatus,
        details: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO execution_state (date, task, status, timestamp, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    date.to_string(),
                    task.as_str(),
                    status.as_str(),
                    Utc::now().to_rfc3339(),
                    details,
                ],
            )
            .map_err(|e| PontoError::Storage(format!("Record result: {e}")))?;
        tracing::info!("💾 {date} {task}: {}", status.as_str());
        Ok(())
    }

    /// Has this task already succeeded on this date? A failed record
    /// keeps the task retry-eligible and returns false here.
    pub fn has_succeeded(&self, date: NaiveDate, task: TaskKind) -> bool {
        self.get(date).succeeded(task)
    }

    /// The full execution state for a date; empty when nothing ran yet.
    /// Read errors degrade to empty with a warning rather than blocking
    /// the day.
    pub fn get(&self, date: NaiveDate) -> ExecutionState {
        let mut stmt = match self.conn.prepare(
            "SELECT task, status, timestamp, details FROM execution_state WHERE date = ?1",
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("⚠️ Failed to query execution state: {e}");
                return ExecutionState::default();
            }
        };

        let rows = stmt
            .query_map([date.to_string()], |row| {
                let task: String = row.get(0)?;
                let status: String = row.get(1)?;
                let timestamp: String = row.get(2)?;
                let details: String = row.get(3)?;
                Ok((task, status, timestamp, details))
            })
            .ok();

        let mut state = ExecutionState::default();
        if let Some(rows) = rows {
            for (task, status, timestamp, details) in rows.flatten() {
                let Some(task) = TaskKind::parse(&task) else {
                    continue;
                };
                let status = if status == "success" {
                    ActionStatus::Success
                } else {
                    ActionStatus::Failed
                };
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                state.records.insert(
                    task,
                    ActionRecord {
                        status,
                        timestamp,
                        details,
                    },
                );
            }
        }
        state
    }
}
