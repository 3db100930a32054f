//! Job DTOs for backend communication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{BatchId, JobId, ProviderId, SpecificationId};
use crate::domain::job::{CompletionStatus, Job, JobState, JobStateError, JobType, RunningStatus};

/// Job record as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: JobId,
    pub job_type: JobType,
    pub specification_id: SpecificationId,
    pub running_status: RunningStatus,
    #[serde(default)]
    pub completion_status: Option<CompletionStatus>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub superseded_by_job_id: Option<JobId>,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    #[serde(default)]
    pub invoker_user_display_name: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl TryFrom<JobSummary> for Job {
    type Error = JobStateError;

    fn try_from(summary: JobSummary) -> Result<Self, Self::Error> {
        let state = JobState::from_parts(summary.running_status, summary.completion_status)?;
        Ok(Job {
            id: summary.job_id,
            job_type: summary.job_type,
            target_id: summary.specification_id,
            state,
            outcome: summary.outcome,
            superseded_by_job_id: summary.superseded_by_job_id,
            batch_id: summary.batch_id,
            invoker: summary.invoker_user_display_name,
            status_timestamp: summary.last_updated,
        })
    }
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        JobSummary {
            job_id: job.id.clone(),
            job_type: job.job_type,
            specification_id: job.target_id.clone(),
            running_status: job.state.running_status(),
            completion_status: job.state.completion_status(),
            outcome: job.outcome.clone(),
            superseded_by_job_id: job.superseded_by_job_id.clone(),
            batch_id: job.batch_id.clone(),
            invoker_user_display_name: job.invoker.clone(),
            last_updated: job.status_timestamp,
        }
    }
}

/// Response to any job-creating request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: JobId,
}

/// Body of batch approve/release requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderIdsRequest {
    pub provider_ids: Vec<ProviderId>,
}
