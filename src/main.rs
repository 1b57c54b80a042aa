// ABOUTME: Command-line entry point for the chunk planner
// ABOUTME: Plans tables from a TOML config, or prints their descriptors with --dry-run

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mysql_chunk_planner::{
    prepare_data_chunks, preview_data_chunks, ChunkRequest, MySqlSource, PlanStatus,
    PlannerConfig, PostgresQueue,
};

#[derive(Parser)]
#[command(name = "mysql-chunk-planner")]
#[command(about = "Split MySQL tables into chunks and queue them for transfer", long_about = None)]
struct Cli {
    /// Path to the planner TOML configuration
    #[arg(long, short, default_value = "planner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan chunks for one or more tables and write them to the data pool queue
    Plan {
        /// Destination table name (repeatable)
        #[arg(long = "table", required = true)]
        tables: Vec<String>,
        /// Column-selection clause stored in each descriptor
        #[arg(long, default_value = "*")]
        select_fields: String,
        /// Skip planning because chunks were already queued
        #[arg(long)]
        already_planned: bool,
        /// Print descriptors instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PlannerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Plan {
            tables,
            select_fields,
            already_planned,
            dry_run,
        } => {
            let pool_size = u32::try_from(config.max_concurrent_writes).unwrap_or(u32::MAX);
            let source = MySqlSource::connect_lazy(&config.source_url, pool_size)?;

            if dry_run {
                for table in &tables {
                    let request = ChunkRequest::new(table.clone(), select_fields.clone());
                    for descriptor in preview_data_chunks(&source, &config, &request).await {
                        println!("{}", descriptor.to_json()?);
                    }
                }
            } else {
                let queue = PostgresQueue::connect_lazy(&config.target_url, pool_size)?;
                for table in tables {
                    let request = ChunkRequest::new(table, select_fields.clone())
                        .already_planned(already_planned);
                    let report = prepare_data_chunks(&source, &queue, &config, &request).await;

                    match &report.status {
                        PlanStatus::AlreadyPlanned => {
                            info!("{}: chunks already planned, skipped", report.table_name)
                        }
                        PlanStatus::Aborted(err) => {
                            warn!("{}: planning aborted: {}", report.table_name, err)
                        }
                        PlanStatus::Planned if report.is_complete() => info!(
                            "{}: queued {} chunks for {} rows",
                            report.table_name,
                            report.persisted(),
                            report.total_rows
                        ),
                        PlanStatus::Planned => warn!(
                            "{}: queued {} of {} chunks",
                            report.table_name,
                            report.persisted(),
                            report.chunks.len()
                        ),
                    }
                }
                queue.close().await;
            }

            source.close().await;
        }
    }

    Ok(())
}
