use anyhow::Result;
use clap::Parser;
use console::style;

use strata_core::config::StrataConfig;
use strata_core::migration::Direction;
use strata_runtime::migrations::{MigrationEngine, ScriptResolver};
use strata_runtime::Database;

use super::TargetArgs;

/// Apply or revert migrations.
#[derive(Parser)]
pub struct MigrateCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Process at most this many migrations.
    #[arg(long)]
    pub steps: Option<usize>,

    /// Show what would run without touching the database.
    #[arg(long)]
    pub dry_run: bool,
}

impl MigrateCommand {
    pub async fn execute(self, direction: Direction, config: StrataConfig) -> Result<()> {
        let config = self.target.apply(config);

        // Fail on a missing directory before the database file gets created
        ScriptResolver::new(&config.migrations.dir)?;

        let db = Database::from_config(&config.database).await?;
        let mut engine = MigrationEngine::from_config(db.clone(), &config.migrations, direction)?;
        if let Some(steps) = self.steps {
            engine = engine.with_limit(steps);
        }

        println!();
        println!(
            "  {} Migrations {} ({})",
            style("STRATA").bold().cyan(),
            style(direction).bold(),
            engine.dir().display()
        );
        println!();

        let result = if self.dry_run {
            print_plan(&engine).await
        } else {
            run(&engine).await
        };

        db.close().await;
        result
    }
}

async fn print_plan(engine: &MigrationEngine) -> Result<()> {
    let plan = engine.plan().await?;

    if plan.is_empty() {
        println!("  {} Nothing to {}", style("ℹ").blue(), engine.direction());
    } else {
        for candidate in &plan {
            println!("  {} {}", style("→").dim(), style(&candidate.name).yellow());
        }
        println!();
        println!(
            "  {} {} migration(s) would be {}",
            style("ℹ").blue(),
            plan.len(),
            engine.direction().past_tense()
        );
    }
    println!();
    Ok(())
}

async fn run(engine: &MigrationEngine) -> Result<()> {
    let direction = engine.direction();
    let report = engine.run().await?;

    for name in &report.completed {
        println!(
            "  {} {} {}",
            style("✓").green(),
            direction.past_tense(),
            style(name).cyan()
        );
    }

    if let Some(failure) = report.failure {
        println!("  {} {}", style("✗").red(), style(&failure.name).red());
        println!();
        anyhow::bail!("Stopped at migration '{}': {}", failure.name, failure.error);
    }

    if report.completed.is_empty() {
        println!("  {} Nothing to {}", style("ℹ").blue(), direction);
    } else {
        println!();
        println!("  {} All migrations ran successfully", style("✓").green());
    }
    println!();
    Ok(())
}
