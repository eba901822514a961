// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, migrations, and lifecycle.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. Do NOT create additional Connection instances for
//! writes: the mutation coordinator relies on closures executing one at a
//! time, in submission order.

use missive_core::MissiveError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into `MissiveError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MissiveError {
    MissiveError::Storage {
        source: Box::new(e),
    }
}

fn map_sql_err(e: rusqlite::Error) -> MissiveError {
    MissiveError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the message database.
///
/// Cloning is cheap; every clone talks to the same background thread.
/// In-memory paths (`:memory:`) are not supported because migrations run on
/// a separate short-lived connection before the shared one is opened.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and apply migrations.
    pub async fn open(path: &str) -> Result<Self, MissiveError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode, and apply migrations.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, MissiveError> {
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), MissiveError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(map_sql_err)?;
            let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
            conn.pragma_update_and_check(None, "journal_mode", journal_mode, |row| {
                row.get::<_, String>(0)
            })
            .map_err(map_sql_err)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| MissiveError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| MissiveError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), MissiveError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), MissiveError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("schema.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table'
                     AND name IN ('timeline', 'messages', 'attachments', 'updates')
                     ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert_eq!(tables, ["attachments", "messages", "timeline", "updates"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_keeps_data_and_skips_applied_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("UPDATE timeline SET last_value = 41 WHERE id = 1", [])?;
                Ok(())
            })
            .await
            .unwrap();
        db.close().await.unwrap();

        let db = Database::open(path).await.unwrap();
        let last: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT last_value FROM timeline WHERE id = 1", [], |row| {
                    row.get(0)
                })
            })
            .await
            .unwrap();
        assert_eq!(last, 41);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("fk.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let result = db
            .connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO attachments (message_id, file_id) VALUES (999, 'orphan')",
                    [],
                )
            })
            .await;
        assert!(result.is_err(), "attachment without message must be rejected");
        db.close().await.unwrap();
    }
}
