use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use strata_core::error::{Result, StrataError};
use strata_core::migration::Direction;

/// Outcome of one engine run.
#[derive(Debug)]
pub struct MigrationReport {
    pub direction: Direction,
    /// Migrations that committed, in execution order.
    pub completed: Vec<String>,
    /// The first failure, after which nothing else was attempted.
    pub failure: Option<MigrationFailure>,
}

impl MigrationReport {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            completed: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Names of the committed migrations, or the failure that stopped the run.
    pub fn into_result(self) -> Result<Vec<String>> {
        match self.failure {
            None => Ok(self.completed),
            Some(failure) => Err(failure.error),
        }
    }
}

/// The migration that stopped a run and why.
#[derive(Debug)]
pub struct MigrationFailure {
    pub name: String,
    pub error: StrataError,
}

impl fmt::Display for MigrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// State of a single migration as seen by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub name: String,
    /// Set when the ledger has a record for this migration.
    pub applied_at: Option<DateTime<Utc>>,
    pub has_up: bool,
    pub has_down: bool,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }

    /// Recorded in the ledger but no longer present on disk.
    pub fn is_missing(&self) -> bool {
        self.is_applied() && !self.has_up && !self.has_down
    }

    /// Not applied and only a `.dn.sql` exists, so no run will ever pick it up.
    pub fn is_orphaned(&self) -> bool {
        !self.is_applied() && !self.has_up
    }

    /// Will be applied by the next forward run.
    pub fn is_pending(&self) -> bool {
        !self.is_applied() && self.has_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        let report = MigrationReport::new(Direction::Up);
        assert!(report.is_success());
        assert!(report.into_result().unwrap().is_empty());
    }

    #[test]
    fn test_failed_report_yields_error() {
        let mut report = MigrationReport::new(Direction::Up);
        report.completed.push("001_init".into());
        report.failure = Some(MigrationFailure {
            name: "002_add_col".into(),
            error: StrataError::ScriptExecution {
                name: "002_add_col".into(),
                direction: Direction::Up,
                source: sqlx::Error::RowNotFound,
            },
        });

        assert!(!report.is_success());
        let err = report.into_result().unwrap_err();
        assert_eq!(err.migration(), Some("002_add_col"));
    }

    #[test]
    fn test_missing_status() {
        let status = MigrationStatus {
            name: "001_init".into(),
            applied_at: Some(Utc::now()),
            has_up: false,
            has_down: false,
        };
        assert!(status.is_applied());
        assert!(status.is_missing());
        assert!(!status.is_orphaned());
    }

    #[test]
    fn test_down_script_only_is_orphaned_not_pending() {
        let status = MigrationStatus {
            name: "999_orphan".into(),
            applied_at: None,
            has_up: false,
            has_down: true,
        };
        assert!(status.is_orphaned());
        assert!(!status.is_pending());
        assert!(!status.is_missing());

        let pending = MigrationStatus {
            has_up: true,
            ..status
        };
        assert!(pending.is_pending());
        assert!(!pending.is_orphaned());
    }
}
