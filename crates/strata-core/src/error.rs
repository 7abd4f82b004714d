use std::path::PathBuf;

use thiserror::Error;

use crate::migration::Direction;

/// Core error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The migration directory does not exist. Raised before anything touches the database.
    #[error("Configuration error: migration directory {} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read migration script {}: {source}", .path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration '{name}' failed ({direction}): {source}")]
    ScriptExecution {
        name: String,
        direction: Direction,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to update ledger for migration '{name}' ({direction}): {source}")]
    LedgerWrite {
        name: String,
        direction: Direction,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl StrataError {
    /// Whether this error stems from configuration rather than from executing anything.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::DirectoryNotFound(_))
    }

    /// Name of the migration this error is attributed to, if any.
    pub fn migration(&self) -> Option<&str> {
        match self {
            Self::ScriptExecution { name, .. } | Self::LedgerWrite { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_not_found_is_configuration() {
        let err = StrataError::DirectoryNotFound(PathBuf::from("/no/such/dir"));
        assert!(err.is_configuration());
        assert!(err.migration().is_none());
        assert_eq!(
            err.to_string(),
            "Configuration error: migration directory /no/such/dir does not exist"
        );
    }

    #[test]
    fn test_execution_error_carries_name_and_direction() {
        let err = StrataError::ScriptExecution {
            name: "002_add_col".into(),
            direction: Direction::Up,
            source: sqlx::Error::RowNotFound,
        };
        assert!(!err.is_configuration());
        assert_eq!(err.migration(), Some("002_add_col"));
        assert!(err.to_string().starts_with("Migration '002_add_col' failed (up): "));
    }

    #[test]
    fn test_ledger_write_error_display() {
        let err = StrataError::LedgerWrite {
            name: "001_init".into(),
            direction: Direction::Down,
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(err.migration(), Some("001_init"));
        assert!(err.to_string().contains("(down)"));
    }
}
