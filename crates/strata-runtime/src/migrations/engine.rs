//! Migration engine.
//!
//! Works out which scripts are pending for the run's direction and executes
//! them one at a time, in order. Each script runs in its own transaction
//! together with its ledger update, so either both commit or neither does.
//! The first failure stops the run.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};

use strata_core::config::MigrationsConfig;
use strata_core::error::{Result, StrataError};
use strata_core::migration::{Direction, MigrationScript};

use super::ledger::Ledger;
use super::report::{MigrationFailure, MigrationReport, MigrationStatus};
use super::resolver::{ScriptCandidate, ScriptResolver};
use crate::db::Database;

/// Applies or reverts the scripts of one directory against one database.
pub struct MigrationEngine {
    db: Database,
    ledger: Ledger,
    dir: PathBuf,
    direction: Direction,
    limit: Option<usize>,
}

impl MigrationEngine {
    pub fn new(db: Database, ledger: Ledger, dir: impl Into<PathBuf>, direction: Direction) -> Self {
        Self {
            db,
            ledger,
            dir: dir.into(),
            direction,
            limit: None,
        }
    }

    /// Build an engine from the `[migrations]` section of the config.
    pub fn from_config(db: Database, config: &MigrationsConfig, direction: Direction) -> Result<Self> {
        let ledger = Ledger::new(config.table.clone())?;
        Ok(Self::new(db, ledger, config.dir.clone(), direction))
    }

    /// Process at most `limit` pending migrations.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pending migrations in execution order. Does not write to the database.
    pub async fn plan(&self) -> Result<Vec<ScriptCandidate>> {
        let resolver = ScriptResolver::new(&self.dir)?;
        let applied = self.applied(false).await?;
        self.pending(&resolver, &applied)
    }

    /// Run every pending migration.
    ///
    /// Errors raised before anything executes (missing directory, unreadable
    /// ledger) are returned as `Err`. A migration that fails is reported in
    /// [`MigrationReport::failure`] after its transaction has been rolled back.
    pub async fn run(&self) -> Result<MigrationReport> {
        let resolver = ScriptResolver::new(&self.dir)?;
        let applied = self.applied(true).await?;
        let pending = self.pending(&resolver, &applied)?;

        let mut report = MigrationReport::new(self.direction);
        if pending.is_empty() {
            info!("No migrations to {}", self.direction);
            return Ok(report);
        }

        debug!(
            "Pending {} migrations: {:?}",
            self.direction,
            pending.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        for candidate in pending {
            let result = match candidate.load() {
                Ok(script) => self.execute(&script).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.completed.push(candidate.name),
                Err(e) => {
                    error!("Migration '{}' failed: {}", candidate.name, e);
                    report.failure = Some(MigrationFailure {
                        name: candidate.name,
                        error: e,
                    });
                    break;
                }
            }
        }

        if report.is_success() {
            info!(
                "All migrations {} successfully ({})",
                self.direction.past_tense(),
                report.completed.len()
            );
        }
        Ok(report)
    }

    /// Every migration known to the directory or the ledger, sorted by name.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        let resolver = ScriptResolver::new(&self.dir)?;

        let records = {
            let mut conn = self.db.pool().acquire().await?;
            if self.ledger.exists(&mut conn).await? {
                self.ledger.records(&mut conn).await?
            } else {
                Vec::new()
            }
        };

        let mut statuses: BTreeMap<String, MigrationStatus> = BTreeMap::new();
        for direction in [Direction::Up, Direction::Down] {
            for candidate in resolver.resolve(direction)? {
                statuses
                    .entry(candidate.name.clone())
                    .or_insert_with(|| MigrationStatus {
                        name: candidate.name.clone(),
                        applied_at: None,
                        has_up: resolver.has_script(&candidate.name, Direction::Up),
                        has_down: resolver.has_script(&candidate.name, Direction::Down),
                    });
            }
        }

        for record in records {
            statuses
                .entry(record.name.clone())
                .or_insert_with(|| MigrationStatus {
                    name: record.name.clone(),
                    applied_at: None,
                    has_up: false,
                    has_down: false,
                })
                .applied_at = Some(record.applied_at);
        }

        Ok(statuses.into_values().collect())
    }

    /// Applied names. With `create` the ledger table is created on first use;
    /// without it a missing table reads as an empty ledger.
    async fn applied(&self, create: bool) -> Result<HashSet<String>> {
        let mut conn = self.db.pool().acquire().await?;

        if create {
            self.ledger.ensure_schema(&mut conn).await?;
        } else if !self.ledger.exists(&mut conn).await? {
            return Ok(HashSet::new());
        }

        self.ledger.load_applied(&mut conn).await
    }

    fn pending(
        &self,
        resolver: &ScriptResolver,
        applied: &HashSet<String>,
    ) -> Result<Vec<ScriptCandidate>> {
        let limit = self.limit.unwrap_or(usize::MAX);

        Ok(resolver
            .resolve(self.direction)?
            .into_iter()
            .filter(|candidate| match self.direction {
                Direction::Up => !applied.contains(&candidate.name),
                Direction::Down => applied.contains(&candidate.name),
            })
            .take(limit)
            .collect())
    }

    async fn execute(&self, script: &MigrationScript) -> Result<()> {
        info!("{} migration: {}", self.direction.verb(), script.name);

        let mut tx = self.db.pool().begin().await?;

        match self.execute_in(&mut tx, script).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|source| StrataError::ScriptExecution {
                        name: script.name.clone(),
                        direction: self.direction,
                        source,
                    })?;
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!("Failed to roll back migration '{}': {}", script.name, rollback);
                }
                return Err(e);
            }
        }

        info!("Migration {}: {}", self.direction.past_tense(), script.name);
        Ok(())
    }

    /// Run the script batch and the matching ledger mutation on `conn`.
    async fn execute_in(&self, conn: &mut SqliteConnection, script: &MigrationScript) -> Result<()> {
        if !script.sql.trim().is_empty() {
            sqlx::raw_sql(&script.sql)
                .execute(&mut *conn)
                .await
                .map_err(|source| StrataError::ScriptExecution {
                    name: script.name.clone(),
                    direction: self.direction,
                    source,
                })?;
        }

        match self.direction {
            Direction::Up => self.ledger.record_applied(conn, &script.name).await,
            Direction::Down => self
                .ledger
                .record_reverted(conn, &script.name)
                .await
                .map(|_| ()),
        }
    }
}
