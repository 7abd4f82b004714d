//! Persisted record of applied migrations.
//!
//! Every call takes the connection to run on, so ledger mutations can join the
//! transaction that runs the migration script itself.

use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

use strata_core::config::validate_table_name;
use strata_core::error::{Result, StrataError};
use strata_core::migration::{Direction, MigrationRecord};

/// Reads and writes the ledger table.
#[derive(Debug, Clone)]
pub struct Ledger {
    table: String,
}

impl Ledger {
    /// Create a ledger stored in `table`. The name must be a plain SQL identifier.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { table })
    }

    /// Create the ledger table if it does not exist yet.
    ///
    /// Timestamps are SQLite `datetime()` text in UTC, stored in `date`.
    pub async fn ensure_schema(&self, conn: &mut SqliteConnection) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(255) UNIQUE NOT NULL,
                date DATETIME NOT NULL
            )
            "#,
            self.table
        );

        sqlx::query(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to create ledger table: {}", e)))?;
        Ok(())
    }

    /// Whether the ledger table has been created.
    pub async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(self.table.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| StrataError::Database(format!("Failed to inspect ledger table: {}", e)))?;

        Ok(count > 0)
    }

    /// Names of every migration currently recorded.
    pub async fn load_applied(&self, conn: &mut SqliteConnection) -> Result<HashSet<String>> {
        let sql = format!("SELECT name FROM {}", self.table);
        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to load ledger: {}", e)))?;

        let applied: HashSet<String> = rows.into_iter().map(|(name,)| name).collect();
        debug!(table = %self.table, count = applied.len(), "Loaded ledger");
        Ok(applied)
    }

    /// Full ledger rows, oldest first.
    pub async fn records(&self, conn: &mut SqliteConnection) -> Result<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, name, date FROM {} ORDER BY id ASC",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StrataError::Database(format!("Failed to load ledger: {}", e)))?;

        rows.iter()
            .map(|row| -> Result<MigrationRecord> {
                Ok(MigrationRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    applied_at: Utc.from_utc_datetime(&row.try_get::<NaiveDateTime, _>("date")?),
                })
            })
            .collect()
    }

    /// Record `name` as applied now.
    pub async fn record_applied(&self, conn: &mut SqliteConnection, name: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (name, date) VALUES (?, datetime('now'))",
            self.table
        );

        sqlx::query(&sql)
            .bind(name)
            .execute(&mut *conn)
            .await
            .map_err(|source| StrataError::LedgerWrite {
                name: name.to_string(),
                direction: Direction::Up,
                source,
            })?;
        Ok(())
    }

    /// Remove the record for `name`.
    ///
    /// Returns `false` when no row matched; that is logged, not treated as an error.
    pub async fn record_reverted(&self, conn: &mut SqliteConnection, name: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE name = ?", self.table);

        let result = sqlx::query(&sql)
            .bind(name)
            .execute(&mut *conn)
            .await
            .map_err(|source| StrataError::LedgerWrite {
                name: name.to_string(),
                direction: Direction::Down,
                source,
            })?;

        if result.rows_affected() == 0 {
            warn!("Ledger had no record of reverted migration '{}'", name);
            return Ok(false);
        }
        Ok(true)
    }
}
