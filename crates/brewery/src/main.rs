use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod task;

use commands::ingest::IngestArgs;
use task::EtlTask;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Brewery sales and production ETL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append sales and production CSV files to the source tables
    Ingest(IngestArgs),
    /// Rebuild the summary tables from the source tables
    Transform,
    /// Print the summary tables and per-product rollups
    Report,
    /// Run the stage named by ETL_TASK (ingest, transform or report; default ingest)
    Run(IngestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .json()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ingest(args) => commands::ingest::run(args).await,
        Command::Transform => commands::transform::run().await,
        Command::Report => commands::report::run().await,
        Command::Run(args) => dispatch(args).await,
    };

    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "brewery run failed");
    }
    result
}

/// `RUST_LOG` when it holds a valid directive, otherwise `info` so retry
/// warnings and the run report are visible.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn dispatch(args: IngestArgs) -> Result<()> {
    dotenvy::dotenv().ok();
    let task = EtlTask::from_env()?;
    info!(task = task.as_str(), "dispatching ETL task");

    match task {
        EtlTask::Ingest => commands::ingest::run(args).await,
        EtlTask::Transform => commands::transform::run().await,
        EtlTask::Report => commands::report::run().await,
    }
}
