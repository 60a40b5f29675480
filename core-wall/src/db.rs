//! # Wall database
//!
//! One pooled SQLite handle per process. Opening the pool applies the
//! embedded migrations, so a fresh file is ready to use:
//!
//! ```rust,ignore
//! use core_wall::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("metalwall.db")).await?;
//! let albums = SqliteAlbumRepository::new(pool.clone());
//! ```
//!
//! File databases run in WAL mode with foreign keys on, so deleting a post
//! also deletes its likes. Tests use [`create_test_pool`].

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tables the wall cannot work without.
const REQUIRED_TABLES: &[&str] = &["albums", "album_likes", "concerts", "concert_likes", "discoveries"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// Private in-memory database, gone when the pool closes
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    pub max_connections: u32,
    /// How long to wait for a free pooled connection
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(database_path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// A single connection, so every query sees the same in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            max_connections: 1,
            ..Self::new(PathBuf::new())
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        if self.location != DatabaseLocation::Memory {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.location {
            DatabaseLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DatabaseLocation::Memory => SqliteConnectOptions::new().in_memory(true),
        };

        options
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
    }
}

/// Open the pool, apply migrations and check the schema.
///
/// # Errors
///
/// - [`LibraryError::Database`] when the file cannot be opened
/// - [`LibraryError::Migration`] when a migration fails or a table is missing
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        location = ?config.location,
        max_connections = config.max_connections,
        "Opening wall database"
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open database");
            LibraryError::Database(e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    verify_schema(&pool).await?;
    debug!("Wall database ready");

    Ok(pool)
}

/// In-memory pool with migrations applied.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn verify_schema(pool: &Pool<Sqlite>) -> Result<()> {
    for table in REQUIRED_TABLES {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(pool)
                .await?;
        if found.is_none() {
            return Err(LibraryError::Migration(format!("table {} is missing", table)));
        }
    }
    Ok(())
}
