//! Batch command handlers
//!
//! Uploads a provider batch, waits for its validation and then approves or
//! releases funding for the providers it resolved to.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use colored::*;
use fundflow_core::domain::id::SpecificationId;
use fundflow_core::domain::permission::Permission;
use fundflow_workflow::repository::{BatchFile, PermissionRepository};
use fundflow_workflow::{BatchActionKind, BatchUploadPipeline};

use super::Backend;
use super::funding::{confirm_and_run, mount};
use crate::config::Config;
use crate::output::print_errors;

/// What to do with the providers of a validated batch
#[derive(Clone, Copy, ValueEnum)]
pub enum BatchAction {
    Approve,
    Release,
}

impl From<BatchAction> for BatchActionKind {
    fn from(action: BatchAction) -> Self {
        match action {
            BatchAction::Approve => BatchActionKind::Approve,
            BatchAction::Release => BatchActionKind::Release,
        }
    }
}

/// Batch subcommands
#[derive(Subcommand)]
pub enum BatchCommands {
    /// Upload a provider batch file and act on its providers
    Upload {
        /// Specification ID
        specification: String,

        /// Batch file (e.g., batch.xlsx)
        file: PathBuf,

        /// Action to take once the batch is validated
        #[arg(long, value_enum)]
        action: BatchAction,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Handle batch commands
///
/// # Arguments
/// * `command` - The batch command to execute
/// * `backend` - Repositories for the funding backend
/// * `config` - The CLI configuration
pub async fn handle_batch_command(
    command: BatchCommands,
    backend: &Backend,
    config: &Config,
) -> Result<()> {
    match command {
        BatchCommands::Upload {
            specification,
            file,
            action,
            yes,
        } => upload_batch(backend, config, specification, file, action, yes).await,
    }
}

async fn upload_batch(
    backend: &Backend,
    config: &Config,
    specification: String,
    path: PathBuf,
    action: BatchAction,
    yes: bool,
) -> Result<()> {
    let specification = SpecificationId::new(specification);

    if !backend
        .permissions
        .has_permission(&specification, Permission::CanUploadBatch)
        .await?
    {
        bail!(
            "{} is required to upload batches for specification {}",
            Permission::CanUploadBatch,
            specification
        );
    }

    let file = BatchFile::read(&path).await?;
    println!(
        "Uploading {} ({} bytes)...",
        file.name.cyan(),
        file.contents.len()
    );

    let mut pipeline = BatchUploadPipeline::new(
        specification.clone(),
        backend.jobs.clone(),
        backend.batches.clone(),
        config.workflow.clone(),
    );
    let batch = pipeline.run(file).await;
    match (&batch, &pipeline.session().batch_id) {
        (Ok(batch), _) => println!(
            "{} Batch {} validated: {} provider(s)",
            "✓".green(),
            batch.batch_id.to_string().cyan(),
            batch.provider_ids.len()
        ),
        (Err(_), Some(batch_id)) => println!("{} Batch {} was not accepted", "✗".red(), batch_id),
        (Err(_), None) => println!("{} Upload failed", "✗".red()),
    }

    let mut workflow = mount(backend, config, specification).await;
    let summary = match workflow.prepare_batch_action(action.into(), batch).await {
        Ok(summary) => summary,
        Err(e) => {
            print_errors(workflow.errors());
            return Err(e.into());
        }
    };

    confirm_and_run(workflow, summary, yes).await
}
