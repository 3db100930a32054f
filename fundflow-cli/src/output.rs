//! Terminal rendering of jobs, status views and workflow results

use colored::*;
use fundflow_core::domain::job::{CompletionStatus, Job, JobState};
use fundflow_workflow::{JobStatusView, UiError, WorkflowEvent};

/// Print detailed job information
pub fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:            {}", job.id.to_string().cyan());
    println!("  Type:          {}", job.job_type.description());
    println!("  Specification: {}", job.target_id.to_string().dimmed());
    println!("  Status:        {}", colorize_state(&job.state));
    println!(
        "  Updated:       {}",
        job.status_timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(invoker) = &job.invoker {
        println!("  Started by:    {}", invoker);
    }

    if let Some(batch) = &job.batch_id {
        println!("  Batch:         {}", batch);
    }

    if let Some(by) = &job.superseded_by_job_id {
        println!("  Superseded by: {}", by.to_string().yellow());
    }

    if let Some(message) = &job.outcome {
        println!("\n{}", "Outcome:".bold());
        println!("{}", message.red());
    }
}

/// Print the derived flags of a job watch
pub fn print_status_view(view: &JobStatusView) {
    if let Some(err) = &view.monitor_error {
        println!("{} {}", "✗".red(), err.to_string().red());
        return;
    }

    match &view.latest_job {
        None if view.is_checking_for_job => println!("{}", "Checking for jobs...".dimmed()),
        None => println!("{}", "No funding jobs found.".yellow()),
        Some(job) => {
            print_job_details(job);
            println!();
            if view.has_active_job {
                let blocked = "Actions are blocked until this job finishes";
                println!("{} {}", "▸".cyan(), blocked.cyan());
            } else if view.is_successful {
                println!("{} {}", "✓".green(), "Last job completed successfully".green());
            } else if view.is_failed {
                println!("{} {}", "✗".red(), "Last job did not succeed".red());
            }
        }
    }
}

/// Print a progress line for an active job
pub fn print_progress(view: &JobStatusView) {
    if let Some(message) = &view.job_in_progress_message {
        println!("  {} {}", "▸".cyan(), message);
    }
}

/// Print the final outcome of a workflow
pub fn print_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::Completed { job_id, redirect } => {
            match job_id {
                Some(id) => println!("{} Job {} completed", "✓".green(), id.to_string().cyan()),
                None => println!("{} Nothing needed to change", "✓".green()),
            }
            println!("  Results: {}", redirect.dimmed());
        }
        WorkflowEvent::Failed { message } => {
            println!("{} {}", "✗".red(), message.red());
        }
    }
}

/// Print render-ready errors, with field names where known
pub fn print_errors(errors: &[UiError]) {
    for err in errors {
        match &err.field_name {
            Some(field) => println!("  {} {}: {}", "✗".red(), field.bold(), err.message),
            None => println!("  {} {}", "✗".red(), err.message),
        }
    }
}

/// Colorize job state for display
fn colorize_state(state: &JobState) -> ColoredString {
    match state {
        JobState::Queued => "Queued".yellow(),
        JobState::InProgress => "In progress".cyan(),
        JobState::Completed(status) => {
            let status_str = format!("Completed ({:?})", status);
            match status {
                CompletionStatus::Succeeded => status_str.green(),
                CompletionStatus::Superseded | CompletionStatus::Cancelled => status_str.dimmed(),
                CompletionStatus::Failed | CompletionStatus::TimedOut => status_str.red(),
            }
        }
    }
}
