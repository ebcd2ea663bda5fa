use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing::{info, warn};

mod mapping;
mod utils;

use mapping::{PlanBuilder, ReferenceRegistry, SampleTable};

#[derive(Parser)]
#[command(author, version, about = "Mapping-strategy planner for spatial-transcriptomics pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a plan for every sample in a sample table and print a summary.
    Plan {
        /// Path to the sample table (CSV).
        #[arg(long)]
        sample_table: PathBuf,
        /// Path to the reference registry (JSON).
        #[arg(long)]
        reference_registry: PathBuf,
        /// Root directory the plan's artifact paths are rooted under.
        #[arg(long)]
        output_root: PathBuf,
        /// Strategy applied to samples that do not specify their own.
        #[arg(long, default_value = "STAR:genome:final")]
        default_strategy: String,
    },
}

#[derive(Tabled)]
struct PlanSummaryRow {
    project_id: String,
    sample_id: String,
    final_path: String,
    rule_count: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan {
            sample_table,
            reference_registry,
            output_root,
            default_strategy,
        } => run_plan(sample_table, reference_registry, output_root, default_strategy),
    }
}

fn run_plan(
    sample_table_path: PathBuf,
    registry_path: PathBuf,
    output_root: PathBuf,
    default_strategy: String,
) -> Result<()> {
    let sample_table = SampleTable::load(&sample_table_path)
        .with_context(|| format!("loading sample table from {}", sample_table_path.display()))?;
    let registry = ReferenceRegistry::load(&registry_path)
        .with_context(|| format!("loading reference registry from {}", registry_path.display()))?;

    info!(
        samples = sample_table.rows().len(),
        "loaded sample table, building plans"
    );

    let results = PlanBuilder::build_all(&sample_table, &registry, &default_strategy, &output_root);

    let mut rows = Vec::new();
    let mut failures = 0usize;
    for ((project_id, sample_id), result) in results {
        match result {
            Ok(plan) => rows.push(PlanSummaryRow {
                project_id,
                sample_id,
                final_path: plan.final_path().display().to_string(),
                rule_count: plan.map_rules().count(),
            }),
            Err(e) => {
                warn!(%project_id, %sample_id, error = %e, "failed to build plan for sample");
                failures += 1;
            }
        }
    }

    println!("{}", Table::new(rows));

    if failures > 0 {
        anyhow::bail!("{failures} sample(s) failed to plan; see warnings above");
    }
    Ok(())
}
