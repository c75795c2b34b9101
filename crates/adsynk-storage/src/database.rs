// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use adsynk_core::AdsynkError;
use tracing::debug;

/// Convert a tokio-rusqlite error into `AdsynkError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AdsynkError {
    AdsynkError::Storage {
        source: Box::new(e),
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    let journal = if wal_mode { "WAL" } else { "DELETE" };
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = {journal}; PRAGMA synchronous = NORMAL; PRAGMA busy_timeout = 5000;"
    ))
}

/// The single writer for one SQLite file.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) a WAL-mode database and apply migrations.
    pub async fn open(path: &str) -> Result<Self, AdsynkError> {
        Self::open_with_wal(path, true).await
    }

    /// Open a database with an explicit journal mode choice.
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, AdsynkError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(AdsynkError::storage)?;
        }

        // Migrations need a plain `&mut Connection`; run them before the
        // background writer thread exists.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AdsynkError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(AdsynkError::storage)?;
            apply_pragmas(&conn, wal_mode).map_err(AdsynkError::storage)?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| AdsynkError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(AdsynkError::storage)?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> { apply_pragmas(conn, wal_mode) })
            .await
            .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The tokio-rusqlite handle that every query module goes through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL, then drop the connection.
    pub async fn close(self) -> Result<(), AdsynkError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
