//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod funding;
mod job;

pub use batch::BatchCommands;
pub use funding::FundingCommands;
pub use job::JobCommands;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use fundflow_client::FundingClient;
use fundflow_workflow::repository::{
    HttpBatchRepository, HttpJobRepository, HttpPermissionRepository,
};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and watch funding jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Refresh, approve or release funding
    Funding {
        #[command(subcommand)]
        command: FundingCommands,
    },
    /// Upload provider batches and act on them
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let backend = Backend::connect(config);

    match command {
        Commands::Job { command } => job::handle_job_command(command, &backend, config).await,
        Commands::Funding { command } => {
            funding::handle_funding_command(command, &backend, config).await
        }
        Commands::Batch { command } => batch::handle_batch_command(command, &backend, config).await,
    }
}

/// HTTP repositories sharing one client
pub struct Backend {
    pub jobs: Arc<HttpJobRepository>,
    pub batches: Arc<HttpBatchRepository>,
    pub permissions: Arc<HttpPermissionRepository>,
}

impl Backend {
    fn connect(config: &Config) -> Self {
        let client = Arc::new(FundingClient::new(config.workflow.api_url.clone()));

        Self {
            jobs: Arc::new(HttpJobRepository::new(client.clone())),
            batches: Arc::new(HttpBatchRepository::new(client.clone())),
            permissions: Arc::new(HttpPermissionRepository::new(client)),
        }
    }
}

/// Asks a yes/no question on stdin; anything but "y"/"yes" declines
fn confirm_prompt(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
