mod engine;
mod ledger;
mod report;
mod resolver;
mod scaffold;

pub use engine::MigrationEngine;
pub use ledger::Ledger;
pub use report::{MigrationFailure, MigrationReport, MigrationStatus};
pub use resolver::{ScriptCandidate, ScriptResolver};
pub use scaffold::{create_migration, ScaffoldedMigration};
