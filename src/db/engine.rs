//! Database engine and connection management

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// SQLite pool for the main database plus where the staging schema lives
pub struct DbEngine {
    pool: SqlitePool,
    staging_path: String,
}

impl DbEngine {
    /// Open (creating if missing) the main database file
    pub async fn connect(main_path: &Path, staging_path: &Path) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", main_path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!(
            "Database: {} (staging: {})",
            main_path.display(),
            staging_path.display()
        );

        Ok(Self {
            pool,
            staging_path: staging_path.display().to_string(),
        })
    }

    /// Private in-memory store; main and staging vanish with the pool
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // a second connection would see a different, empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self {
            pool,
            staging_path: ":memory:".to_string(),
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file attached as the `staging` schema
    pub fn staging_path(&self) -> &str {
        &self.staging_path
    }
}
