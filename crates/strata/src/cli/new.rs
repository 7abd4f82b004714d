use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use strata_core::config::StrataConfig;
use strata_runtime::migrations::create_migration;

/// Create a new migration.
#[derive(Parser)]
pub struct NewCommand {
    /// Descriptive name, e.g. "create users".
    pub name: String,

    /// Directory to create the scripts in (overrides config).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

impl NewCommand {
    pub fn execute(self, config: StrataConfig) -> Result<()> {
        let dir = self.dir.unwrap_or(config.migrations.dir);
        let created = create_migration(&dir, &self.name)?;

        println!(
            "  {} Created migration {}",
            style("✓").green(),
            style(&created.name).cyan()
        );
        println!("    {}", created.up_path.display());
        println!("    {}", created.down_path.display());
        Ok(())
    }
}
