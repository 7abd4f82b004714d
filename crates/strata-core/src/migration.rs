use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Which way a run moves the schema. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply pending migrations.
    Up,
    /// Revert applied migrations.
    Down,
}

impl Direction {
    /// File suffix of the scripts eligible in this direction.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Up => ".up.sql",
            Self::Down => ".dn.sql",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Progressive verb used in log lines ("Applying", "Reverting").
    pub fn verb(self) -> &'static str {
        match self {
            Self::Up => "Applying",
            Self::Down => "Reverting",
        }
    }

    /// Past-tense verb used in reports ("applied", "reverted").
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Up => "applied",
            Self::Down => "reverted",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" | "dn" => Ok(Self::Down),
            other => Err(StrataError::Config(format!(
                "unknown direction '{}', expected 'up' or 'down'",
                other
            ))),
        }
    }
}

/// One row of the ledger: a migration that is currently applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Migration name, unique across the ledger.
    pub name: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

/// A directional SQL script read from the migration directory.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// Base filename with the direction suffix stripped.
    pub name: String,
    pub direction: Direction,
    pub path: PathBuf,
    /// Full script text, executed verbatim as one batch.
    pub sql: String,
}

impl MigrationScript {
    /// Derive a migration name from a file name, if the file belongs to `direction`.
    ///
    /// Returns `None` for files with another suffix or with nothing before the suffix.
    pub fn name_from_file(file_name: &str, direction: Direction) -> Option<&str> {
        file_name
            .strip_suffix(direction.suffix())
            .filter(|name| !name.is_empty())
    }
}
