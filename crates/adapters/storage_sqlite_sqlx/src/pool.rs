//! Opening the schedule database.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::StorageError;

/// Where the schedule database lives.
pub struct Config {
    /// sqlx `SQLite` URL, such as `sqlite:timer24h.db` or `sqlite::memory:`.
    pub database_url: String,
}

impl Config {
    /// Open the database, creating the file on first use, and bring the
    /// `schedules` table up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the URL is unusable, the connection
    /// cannot be opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(database_url = %self.database_url, "schedule database ready");

        Ok(Database { pool })
    }
}

/// Open schedule database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection pool handed to [`SqliteScheduleStore`](crate::SqliteScheduleStore).
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
