mod migrate;
mod new;
mod status;

pub use migrate::MigrateCommand;
pub use new::NewCommand;
pub use status::StatusCommand;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use strata_core::config::StrataConfig;
use strata_core::migration::Direction;

/// strata - versioned SQL migrations for SQLite
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "strata.toml", global = true)]
    pub config: String,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending migrations.
    Up(MigrateCommand),

    /// Revert applied migrations, newest first.
    Down(MigrateCommand),

    /// Show which migrations are applied and which are pending.
    Status(StatusCommand),

    /// Create an empty up/down migration pair.
    New(NewCommand),
}

/// Database target and migration directory, shared by the commands that need them.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Database to migrate: a `sqlite:` URL or a file path (overrides config).
    pub db: Option<String>,

    /// Directory containing the .up.sql / .dn.sql scripts (overrides config).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

impl TargetArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: StrataConfig) -> StrataConfig {
        if let Some(db) = &self.db {
            config.database.url = db.clone();
        }
        if let Some(dir) = &self.dir {
            config.migrations.dir = dir.clone();
        }
        config
    }
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        // Load .env so ${VAR} placeholders in the config resolve
        dotenvy::dotenv().ok();

        let log_level = if self.verbose { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .with_target(false)
            .init();

        let config = StrataConfig::from_file_or_default(&self.config)?;
        debug!("Loaded configuration from {}", self.config);

        match self.command {
            Commands::Up(cmd) => cmd.execute(Direction::Up, config).await,
            Commands::Down(cmd) => cmd.execute(Direction::Down, config).await,
            Commands::Status(cmd) => cmd.execute(config).await,
            Commands::New(cmd) => cmd.execute(config),
        }
    }
}
