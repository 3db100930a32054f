//! Fundflow CLI
//!
//! Command-line host for funding workflows: watch jobs, run funding actions
//! and upload provider batches against the funding backend.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fundflow")]
#[command(about = "Funding job orchestration CLI", long_about = None)]
struct Cli {
    /// Funding backend URL
    #[arg(long, env = "FUNDFLOW_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Poll interval in milliseconds
    #[arg(long, env = "FUNDFLOW_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.api_url, cli.poll_interval_ms)?;

    handle_command(cli.command, &config).await
}
