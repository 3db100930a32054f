//! Job command handlers
//!
//! Shows the latest funding job of a specification and follows jobs until
//! they finish.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use fundflow_core::domain::id::{JobId, SpecificationId};
use fundflow_core::domain::job::JobType;
use fundflow_workflow::{JobMonitor, MonitorEvent};

use super::Backend;
use crate::config::Config;
use crate::output::{print_job_details, print_progress, print_status_view};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Show the latest job for a specification
    Latest {
        /// Specification ID
        specification: String,

        /// Job types to consider (e.g., refresh, approve-all, csv)
        ///
        /// All funding action types when omitted
        #[arg(long = "type")]
        types: Vec<JobType>,
    },
    /// Follow jobs on a specification until none is active
    Watch {
        /// Specification ID
        specification: String,

        /// Follow this job until it finishes instead
        #[arg(long)]
        job: Option<String>,
    },
}

/// Handle job commands
///
/// # Arguments
/// * `command` - The job command to execute
/// * `backend` - Repositories for the funding backend
/// * `config` - The CLI configuration
pub async fn handle_job_command(
    command: JobCommands,
    backend: &Backend,
    config: &Config,
) -> Result<()> {
    match command {
        JobCommands::Latest {
            specification,
            types,
        } => latest_job(backend, config, specification, types).await,
        JobCommands::Watch { specification, job } => {
            watch_jobs(backend, config, specification, job).await
        }
    }
}

fn job_filter(types: Vec<JobType>) -> Vec<JobType> {
    if types.is_empty() {
        JobType::FUNDING_ACTIONS.to_vec()
    } else {
        types
    }
}

/// Poll once and print the view
async fn latest_job(
    backend: &Backend,
    config: &Config,
    specification: String,
    types: Vec<JobType>,
) -> Result<()> {
    let mut monitor = JobMonitor::watch(
        backend.jobs.clone(),
        SpecificationId::new(specification),
        job_filter(types),
        &config.workflow,
    );

    if let MonitorEvent::Retrying { .. } = monitor.poll_once().await? {
        println!("{}", "⚠ Could not reach the funding backend".yellow());
        return Ok(());
    }

    print_status_view(&monitor.status());
    Ok(())
}

/// Poll until the specification is idle, or the given job finishes
async fn watch_jobs(
    backend: &Backend,
    config: &Config,
    specification: String,
    job: Option<String>,
) -> Result<()> {
    let specification = SpecificationId::new(specification);
    let mut monitor = JobMonitor::watch(
        backend.jobs.clone(),
        specification.clone(),
        JobType::ALL.to_vec(),
        &config.workflow,
    );

    println!(
        "{}",
        format!("Watching jobs for specification {}...", specification).bold()
    );

    let mut progress = monitor.subscribe();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let view = progress.borrow_and_update().clone();
            if view.has_active_job {
                print_progress(&view);
            }
        }
    });

    let result = match job {
        Some(job_id) => {
            monitor.track(JobId::new(job_id));
            monitor.wait_for_tracked().await.map(|finished| {
                println!();
                print_job_details(&finished.job);
            })
        }
        None => monitor.wait_until_idle().await.map(|view| {
            println!();
            print_status_view(&view);
        }),
    };
    printer.abort();

    Ok(result?)
}
