//! Derived job status flags
//!
//! The view a host renders while watching a specification. Every flag is
//! recomputed from the latest snapshot, and all of them are cleared before
//! a snapshot of a different job is applied.

use fundflow_core::domain::job::{CompletionStatus, Job};

use crate::error::MonitorError;

/// Observable state of a job watch
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusView {
    /// True until the first poll response arrives
    pub is_checking_for_job: bool,
    /// Most recent job matching the watch filter
    pub latest_job: Option<Job>,
    /// The latest job exists and is not completed
    pub has_active_job: bool,
    pub is_complete: bool,
    pub is_failed: bool,
    pub is_successful: bool,
    pub job_in_progress_message: Option<String>,
    /// Set once polling has failed more often than allowed
    pub monitor_error: Option<MonitorError>,
}

impl JobStatusView {
    pub(crate) fn checking() -> Self {
        Self {
            is_checking_for_job: true,
            latest_job: None,
            has_active_job: false,
            is_complete: false,
            is_failed: false,
            is_successful: false,
            job_in_progress_message: None,
            monitor_error: None,
        }
    }

    /// Clears every flag derived from a job
    fn reset(&mut self) {
        self.latest_job = None;
        self.has_active_job = false;
        self.is_complete = false;
        self.is_failed = false;
        self.is_successful = false;
        self.job_in_progress_message = None;
    }

    /// No job matches the watch
    pub(crate) fn clear(&mut self) -> bool {
        let changed = self.is_checking_for_job || self.latest_job.is_some();
        self.is_checking_for_job = false;
        self.reset();
        changed
    }

    /// Applies a snapshot, returning whether the view changed
    ///
    /// A snapshot older than the one already applied for the same job id is
    /// ignored.
    pub(crate) fn apply_snapshot(&mut self, job: Job) -> bool {
        let was_checking = self.is_checking_for_job;
        self.is_checking_for_job = false;

        if let Some(current) = &self.latest_job {
            if current.id == job.id
                && (job.status_timestamp < current.status_timestamp || *current == job)
            {
                return was_checking;
            }
        }

        if self
            .latest_job
            .as_ref()
            .is_some_and(|current| current.id != job.id)
        {
            self.reset();
        }

        let completion = job.state.completion_status();
        self.has_active_job = job.is_active();
        self.is_complete = completion.is_some();
        self.is_successful = completion == Some(CompletionStatus::Succeeded);
        self.is_failed = completion.is_some_and(|status| status != CompletionStatus::Succeeded);
        self.job_in_progress_message = Some(job.progress_message());
        self.latest_job = Some(job);
        true
    }
}
