//! Funding command handlers
//!
//! Runs refresh, approve and release through a funding workflow: permission
//! check, confirmation, submission and tracking until the job settles.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;
use fundflow_core::domain::id::{ProviderId, SpecificationId};
use fundflow_workflow::{
    ActionIntent, ConfirmationSummary, FundingScope, FundingWorkflow, WorkflowEvent,
};
use tokio::time;

use super::{Backend, confirm_prompt};
use crate::config::Config;
use crate::output::{print_errors, print_event, print_progress};

/// Funding subcommands
#[derive(Subcommand)]
pub enum FundingCommands {
    /// Recalculate funding for a specification
    Refresh {
        /// Specification ID
        specification: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Approve funding, for all providers or the given ones
    Approve {
        /// Specification ID
        specification: String,

        /// Provider to approve (repeatable)
        #[arg(long = "provider")]
        providers: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Release funding, for all providers or the given ones
    Release {
        /// Specification ID
        specification: String,

        /// Provider to release (repeatable)
        #[arg(long = "provider")]
        providers: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Handle funding commands
///
/// # Arguments
/// * `command` - The funding command to execute
/// * `backend` - Repositories for the funding backend
/// * `config` - The CLI configuration
pub async fn handle_funding_command(
    command: FundingCommands,
    backend: &Backend,
    config: &Config,
) -> Result<()> {
    let (specification, intent, yes) = match command {
        FundingCommands::Refresh { specification, yes } => {
            (specification, ActionIntent::Refresh, yes)
        }
        FundingCommands::Approve {
            specification,
            providers,
            yes,
        } => (specification, ActionIntent::Approve(scope(providers)), yes),
        FundingCommands::Release {
            specification,
            providers,
            yes,
        } => (specification, ActionIntent::Release(scope(providers)), yes),
    };

    let mut workflow = mount(backend, config, SpecificationId::new(specification)).await;

    if let Err(e) = workflow.request_action(intent).await {
        print_errors(workflow.errors());
        return Err(e.into());
    }
    let summary = workflow.show_confirmation()?;

    confirm_and_run(workflow, summary, yes).await
}

fn scope(providers: Vec<String>) -> FundingScope {
    if providers.is_empty() {
        FundingScope::All
    } else {
        FundingScope::Providers(providers.into_iter().map(ProviderId::new).collect())
    }
}

/// Creates a workflow and polls until the specification's job status is known
///
/// Stops early when the monitor gives up; the workflow then rejects actions
/// and reports the monitor error.
pub(super) async fn mount(
    backend: &Backend,
    config: &Config,
    specification: SpecificationId,
) -> FundingWorkflow {
    let mut workflow = FundingWorkflow::new(
        specification,
        backend.jobs.clone(),
        backend.permissions.clone(),
        config.workflow.clone(),
    );
    let mut interval = time::interval(config.workflow.poll_interval);
    loop {
        interval.tick().await;
        workflow.poll().await;

        let view = workflow.monitor_status();
        if !view.is_checking_for_job || view.monitor_error.is_some() {
            break;
        }
    }
    workflow
}

/// Asks for confirmation, submits and follows the job until it settles
pub(super) async fn confirm_and_run(
    mut workflow: FundingWorkflow,
    summary: ConfirmationSummary,
    yes: bool,
) -> Result<()> {
    print_summary(&summary);

    if !yes && !confirm_prompt("Proceed?")? {
        workflow.cancel()?;
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    let event = match workflow.confirm().await {
        Ok(Some(event)) => event,
        Ok(None) => {
            let job_id = workflow
                .session()
                .and_then(|s| s.submitted_job_id.clone())
                .map(|id| id.to_string())
                .unwrap_or_default();
            println!("Submitted job {}", job_id.cyan());

            let mut progress = workflow.subscribe();
            let printer = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let view = progress.borrow_and_update().clone();
                    if view.has_active_job {
                        print_progress(&view);
                    }
                }
            });

            let event = workflow.run_until_settled().await;
            printer.abort();
            event?
        }
        Err(e) => {
            print_errors(workflow.errors());
            return Err(e.into());
        }
    };

    print_event(&event);
    workflow.unmount();

    match event {
        WorkflowEvent::Completed { .. } => Ok(()),
        WorkflowEvent::Failed { .. } => Err(anyhow!("{} did not complete", summary.action)),
    }
}

fn print_summary(summary: &ConfirmationSummary) {
    println!("{}", "Confirm funding action:".bold());
    println!("  Action:        {}", summary.action.to_string().cyan());
    println!("  Specification: {}", summary.target_id);

    if summary.provider_ids.is_empty() {
        println!("  Providers:     {}", "all".dimmed());
    } else {
        println!("  Providers:     {}", summary.provider_ids.len());
        for id in &summary.provider_ids {
            println!("    {} {}", "▸".cyan(), id);
        }
    }
}
