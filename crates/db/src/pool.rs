//! Database connection pool management.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Upper bound for acquiring a connection or waiting on a locked database.
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Database connection pool wrapper.
///
/// Cloning is cheap; every clone shares the same underlying pool, so the
/// ingestion task and the query handlers can hold their own handle.
#[derive(Clone)]
pub struct DbPool {
    pool: SqlitePool,
}

impl DbPool {
    /// Create a new database pool from a SQLite URL or file path.
    ///
    /// # Arguments
    /// * `database_url` - `sqlite://path`, `sqlite:path` or a bare file path
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(STORE_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(STORE_TIMEOUT)
            .connect_with(options)
            .await?;

        info!("Connected to database at {}", database_url);

        Ok(Self { pool })
    }

    /// Create a private in-memory database.
    ///
    /// Each SQLite connection to `:memory:` owns a separate database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .acquire_timeout(STORE_TIMEOUT)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Connect, retrying a fixed number of times before giving up.
    ///
    /// # Arguments
    /// * `database_url` - Database URL passed to [`DbPool::new`]
    /// * `attempts` - Total number of connection attempts (at least one is made)
    /// * `delay` - Pause between failed attempts
    pub async fn connect_with_retry(
        database_url: &str,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self> {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            match Self::new(database_url).await {
                Ok(db) => return Ok(db),
                Err(e) => {
                    error!("Failed to connect to database (attempt {}/{}): {}", attempt, attempts, e);
                    if attempt < attempts {
                        warn!("Retrying in {} seconds...", delay.as_secs());
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Max retries reached. Unable to connect to the database at {}",
            database_url
        ))
    }

    /// Get a reference to the underlying SQLite pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Execute a migration to set up the database schema.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
