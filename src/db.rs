//! SQLite database connection management.
//!
//! Provides a connection pool to the knowledge-base file with WAL mode
//! enabled. The database file and its parent directories are created
//! automatically if they don't exist.
//!
//! # Write-Ahead Logging (WAL)
//!
//! WAL lets a search read while an ingestion writes without blocking.
//! It does not make concurrent writers safe to interleave: upserts remain
//! last-writer-wins.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use ragkb_core::store::DocumentStore;
use ragkb_core::{Error, Result};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Create a connection pool to the SQLite database at `db_path`.
///
/// - Creates the database file and parent directories if they don't exist.
/// - Enables WAL journal mode.
/// - Returns a pool with up to 5 connections.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .map_err(Error::storage)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(Error::storage)
}

/// Open the configured knowledge base and make sure its schema exists.
pub async fn open_store(config: &Config) -> Result<SqliteStore> {
    let store = SqliteStore::open(&config.db.path).await?;
    store.initialize().await?;
    Ok(store)
}
