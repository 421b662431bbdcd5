mod pings;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "livemap")]
#[command(about = "Emergency incident feed sync and live ping tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the feed once and reconcile it into the store
    Sync {
        /// Print the full outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show the writes and deletes a sync would perform without applying them
    Plan {
        /// Print the plan as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Long-poll the Telegram bot for Waze pings until interrupted
    Pings {
        /// Stop after this many pings have been collected
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = livemap_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync { json } => sync::run_sync(&config, json).await,
        Commands::Plan { json } => sync::run_plan(&config, json).await,
        Commands::Pings { limit } => pings::run_pings(&config, limit).await,
    }
}
