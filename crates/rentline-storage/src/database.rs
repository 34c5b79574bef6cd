// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::time::Duration;

use rentline_core::RentlineError;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database behind a tokio-rusqlite connection.
///
/// Opening runs the embedded migrations and applies the standard PRAGMAs
/// (WAL journal when enabled, NORMAL synchronous, foreign keys, busy
/// timeout).
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if necessary) the database at `path` and brings the
    /// schema up to date.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, RentlineError> {
        let parent = std::path::Path::new(path).parent();
        if let Some(dir) = parent {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| RentlineError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| RentlineError::Storage {
                source: Box::new(e),
            })?;

        conn.call(
            move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                conn.busy_timeout(Duration::from_secs(5))?;
                if wal_mode {
                    // journal_mode returns the resulting mode as a row.
                    let _mode: String =
                        conn.query_row("PRAGMA journal_mode=WAL;", [], |row| row.get(0))?;
                }
                conn.execute_batch("PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;

                migrations::run_migrations(conn)?;
                Ok(())
            },
        )
        .await
        .map_err(|e| RentlineError::Storage {
            source: match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                tokio_rusqlite::Error::Close((_, err)) => Box::new(err),
                other => Box::new(std::io::Error::other(other.to_string())),
            },
        })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and releases the connection.
    pub async fn close(&self) -> Result<(), RentlineError> {
        self.conn
            .call(|conn| {
                // wal_checkpoint returns a (busy, log, checkpointed) row.
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Maps a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> RentlineError {
    RentlineError::Storage {
        source: Box::new(e),
    }
}
