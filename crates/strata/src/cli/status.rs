use anyhow::Result;
use clap::Parser;
use console::style;

use strata_core::config::StrataConfig;
use strata_core::migration::Direction;
use strata_runtime::migrations::{MigrationEngine, MigrationStatus, ScriptResolver};
use strata_runtime::Database;

use super::TargetArgs;

/// Show migration status.
#[derive(Parser)]
pub struct StatusCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the status as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(self, config: StrataConfig) -> Result<()> {
        let config = self.target.apply(config);

        // Fail on a missing directory before the database file gets created
        ScriptResolver::new(&config.migrations.dir)?;

        let db = Database::from_config(&config.database).await?;
        let engine = MigrationEngine::from_config(db.clone(), &config.migrations, Direction::Up)?;
        let statuses = engine.status().await;
        db.close().await;
        let statuses = statuses?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&statuses)?);
            return Ok(());
        }

        print_status(&statuses);
        Ok(())
    }
}

fn print_status(statuses: &[MigrationStatus]) {
    println!();
    println!("  {} Migration Status", style("STRATA").bold().cyan());
    println!();

    if statuses.is_empty() {
        println!("  {} No migrations found", style("ℹ").blue());
        println!();
        return;
    }

    for status in statuses {
        let down_marker = if status.has_down {
            style("↓").green().to_string()
        } else {
            style("-").dim().to_string()
        };

        match status.applied_at {
            Some(applied_at) if status.is_missing() => println!(
                "  {} {} {} ({}, script missing)",
                style("!").red(),
                down_marker,
                style(&status.name).red(),
                applied_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Some(applied_at) => println!(
                "  {} {} {} ({})",
                style("✓").green(),
                down_marker,
                style(&status.name).cyan(),
                applied_at.format("%Y-%m-%d %H:%M:%S")
            ),
            None if status.is_orphaned() => println!(
                "  {} {} {} (down script only, never applied)",
                style("!").yellow(),
                down_marker,
                style(&status.name).dim()
            ),
            None => println!(
                "  {} {} {}",
                style("○").yellow(),
                down_marker,
                style(&status.name).yellow()
            ),
        }
    }

    let applied = statuses.iter().filter(|s| s.is_applied()).count();
    let pending = statuses.iter().filter(|s| s.is_pending()).count();
    let orphaned = statuses.iter().filter(|s| s.is_orphaned()).count();
    println!();
    if orphaned > 0 {
        println!(
            "  {} {} applied, {} pending, {} without up script",
            style("ℹ").blue(),
            applied,
            pending,
            orphaned
        );
    } else {
        println!(
            "  {} {} applied, {} pending",
            style("ℹ").blue(),
            applied,
            pending
        );
    }
    println!(
        "  {} = has down migration, {} = no down migration",
        style("↓").green(),
        style("-").dim()
    );
    println!();
}
