use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// Default directory holding the `.up.sql` / `.dn.sql` scripts.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default name of the ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "_strata_migrations";

/// Where migrations live and where their ledger is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Migration script directory.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Ledger table name.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            table: default_table(),
        }
    }
}

impl MigrationsConfig {
    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table)
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIGRATIONS_DIR)
}

fn default_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

/// Check that `table` is a bare SQL identifier. It gets interpolated into statements.
pub fn validate_table_name(table: &str) -> Result<()> {
    let re = regex_lite::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern");
    if re.is_match(table) {
        Ok(())
    } else {
        Err(StrataError::Config(format!(
            "invalid ledger table name '{}': expected letters, digits and underscores",
            table
        )))
    }
}
