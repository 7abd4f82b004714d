use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use strata_core::config::DatabaseConfig;
use strata_core::error::{Result, StrataError};

/// Handle on the target database.
///
/// The pool holds a single connection: one run owns the only handle, so
/// statements never overlap and an in-memory database lives as long as the handle.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database described by `config`.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(StrataError::Config(
                "no database given: pass a target or set [database].url".into(),
            ));
        }

        let options = Self::connect_options(&config.url)?
            .create_if_missing(config.create_if_missing)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                StrataError::Database(format!("Failed to open {}: {}", config.url, e))
            })?;

        Ok(Self { pool })
    }

    /// Open the database at `url` with default settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::from_config(&DatabaseConfig::with_url(url)).await
    }

    /// Accepts `sqlite:` URLs as-is and treats anything else as a file path.
    fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
        if url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(url).map_err(|e| {
                StrataError::Config(format!("Invalid database URL '{}': {}", url, e))
            })
        } else {
            Ok(SqliteConnectOptions::new().filename(url))
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
