//! Job domain types
//!
//! A job is a backend-tracked unit of asynchronous work. The client only
//! observes jobs: every `Job` value is a read-only snapshot of the record the
//! backend holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{BatchId, JobId, SpecificationId};

/// Kind of backend job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "RefreshFundingJob")]
    RefreshFunding,
    #[serde(rename = "ApproveAllProviderFundingJob")]
    ApproveAllFunding,
    #[serde(rename = "ApproveBatchProviderFundingJob")]
    ApproveBatchFunding,
    #[serde(rename = "PublishAllProviderFundingJob")]
    PublishAllFunding,
    #[serde(rename = "PublishBatchProviderFundingJob")]
    PublishBatchFunding,
    #[serde(rename = "BatchProviderValidationJob")]
    ValidateBatch,
    #[serde(rename = "GeneratePublishedFundingCsvJob")]
    GenerateCsv,
    #[serde(rename = "PublishedFundingUndoJob")]
    UndoPublish,
    #[serde(rename = "ReIndexPublishedProvidersJob")]
    ReIndexProviders,
}

impl JobType {
    /// Every job type, in display order
    pub const ALL: [JobType; 9] = [
        JobType::RefreshFunding,
        JobType::ApproveAllFunding,
        JobType::ApproveBatchFunding,
        JobType::PublishAllFunding,
        JobType::PublishBatchFunding,
        JobType::ValidateBatch,
        JobType::GenerateCsv,
        JobType::UndoPublish,
        JobType::ReIndexProviders,
    ];

    /// Job types that change funding state. A running job of any of these
    /// kinds blocks new funding actions on the same specification.
    pub const FUNDING_ACTIONS: [JobType; 5] = [
        JobType::RefreshFunding,
        JobType::ApproveAllFunding,
        JobType::ApproveBatchFunding,
        JobType::PublishAllFunding,
        JobType::PublishBatchFunding,
    ];

    /// Name used by the backend for this job type
    pub fn wire_name(&self) -> &'static str {
        match self {
            JobType::RefreshFunding => "RefreshFundingJob",
            JobType::ApproveAllFunding => "ApproveAllProviderFundingJob",
            JobType::ApproveBatchFunding => "ApproveBatchProviderFundingJob",
            JobType::PublishAllFunding => "PublishAllProviderFundingJob",
            JobType::PublishBatchFunding => "PublishBatchProviderFundingJob",
            JobType::ValidateBatch => "BatchProviderValidationJob",
            JobType::GenerateCsv => "GeneratePublishedFundingCsvJob",
            JobType::UndoPublish => "PublishedFundingUndoJob",
            JobType::ReIndexProviders => "ReIndexPublishedProvidersJob",
        }
    }

    /// Short human-readable description for progress messages
    pub fn description(&self) -> &'static str {
        match self {
            JobType::RefreshFunding => "Refresh funding",
            JobType::ApproveAllFunding => "Approve funding",
            JobType::ApproveBatchFunding => "Approve batch funding",
            JobType::PublishAllFunding => "Release funding",
            JobType::PublishBatchFunding => "Release batch funding",
            JobType::ValidateBatch => "Batch validation",
            JobType::GenerateCsv => "Funding CSV generation",
            JobType::UndoPublish => "Undo release",
            JobType::ReIndexProviders => "Provider re-index",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    /// Accepts either the backend name or a short kebab-case alias
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let job_type = match s {
            "refresh" => JobType::RefreshFunding,
            "approve-all" => JobType::ApproveAllFunding,
            "approve-batch" => JobType::ApproveBatchFunding,
            "release-all" => JobType::PublishAllFunding,
            "release-batch" => JobType::PublishBatchFunding,
            "validate-batch" => JobType::ValidateBatch,
            "csv" => JobType::GenerateCsv,
            "undo" => JobType::UndoPublish,
            "reindex" => JobType::ReIndexProviders,
            other => JobType::ALL
                .into_iter()
                .find(|t| t.wire_name() == other)
                .ok_or_else(|| format!("Unknown job type: {}", other))?,
        };
        Ok(job_type)
    }
}

/// Running status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunningStatus {
    Queued,
    InProgress,
    Completed,
}

/// Completion status, only meaningful once a job is completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
    Superseded,
}

impl CompletionStatus {
    fn describe(&self) -> &'static str {
        match self {
            CompletionStatus::Succeeded => "completed successfully",
            CompletionStatus::Failed => "failed",
            CompletionStatus::Cancelled => "was cancelled",
            CompletionStatus::TimedOut => "timed out",
            CompletionStatus::Superseded => "was superseded",
        }
    }
}

/// Lifecycle state of a job
///
/// A completion status exists exactly when the job is completed, so the two
/// backend fields are folded into one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InProgress,
    Completed(CompletionStatus),
}

/// Backend reported a status pair that violates the completion invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobStateError {
    #[error("Job is {0:?} but carries completion status {1:?}")]
    UnexpectedCompletion(RunningStatus, CompletionStatus),

    #[error("Job is completed without a completion status")]
    MissingCompletion,
}

impl JobState {
    /// Builds a state from the two backend fields
    pub fn from_parts(
        running: RunningStatus,
        completion: Option<CompletionStatus>,
    ) -> Result<Self, JobStateError> {
        match (running, completion) {
            (RunningStatus::Queued, None) => Ok(JobState::Queued),
            (RunningStatus::InProgress, None) => Ok(JobState::InProgress),
            (RunningStatus::Completed, Some(status)) => Ok(JobState::Completed(status)),
            (RunningStatus::Completed, None) => Err(JobStateError::MissingCompletion),
            (running, Some(status)) => Err(JobStateError::UnexpectedCompletion(running, status)),
        }
    }

    pub fn running_status(&self) -> RunningStatus {
        match self {
            JobState::Queued => RunningStatus::Queued,
            JobState::InProgress => RunningStatus::InProgress,
            JobState::Completed(_) => RunningStatus::Completed,
        }
    }

    pub fn completion_status(&self) -> Option<CompletionStatus> {
        match self {
            JobState::Completed(status) => Some(*status),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobState::Completed(_))
    }
}

/// Job snapshot as observed by the client
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub target_id: SpecificationId,
    pub state: JobState,
    /// Detail message, present when the job failed
    pub outcome: Option<String>,
    pub superseded_by_job_id: Option<JobId>,
    /// Batch that a validation job was created for
    pub batch_id: Option<BatchId>,
    /// Who triggered the job
    pub invoker: Option<String>,
    pub status_timestamp: DateTime<Utc>,
}

/// Final result of a completed job, from the point of view of whoever waits on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// Failed, cancelled or timed out
    Failed {
        status: CompletionStatus,
        message: String,
    },
    /// Replaced by a newer job of the same category before it finished
    Superseded { by: Option<JobId> },
}

impl Job {
    /// A job is terminal once completed, whatever the completion status
    pub fn is_terminal(&self) -> bool {
        self.state.is_completed()
    }

    /// True while the job is queued or running
    pub fn is_active(&self) -> bool {
        !self.state.is_completed()
    }

    /// Classifies a completed job, `None` while it is still active
    pub fn outcome(&self) -> Option<JobOutcome> {
        let status = self.state.completion_status()?;
        let outcome = match status {
            CompletionStatus::Succeeded => JobOutcome::Succeeded,
            CompletionStatus::Superseded => JobOutcome::Superseded {
                by: self.superseded_by_job_id.clone(),
            },
            CompletionStatus::Failed | CompletionStatus::Cancelled | CompletionStatus::TimedOut => {
                let message = self.outcome.clone().unwrap_or_else(|| {
                    format!("{} {}", self.job_type.description(), status.describe())
                });
                JobOutcome::Failed { status, message }
            }
        };
        Some(outcome)
    }

    /// Progress line for display, derived from job type and state
    pub fn progress_message(&self) -> String {
        let description = self.job_type.description();
        match self.state {
            JobState::Queued => format!("{} job is queued", description),
            JobState::InProgress => format!("{} job is in progress", description),
            JobState::Completed(status) => format!("{} job {}", description, status.describe()),
        }
    }
}
