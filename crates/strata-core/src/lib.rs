pub mod config;
pub mod error;
pub mod migration;

pub use config::StrataConfig;
pub use error::{Result, StrataError};
pub use migration::{Direction, MigrationRecord, MigrationScript};
