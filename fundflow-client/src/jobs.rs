//! Job-related API endpoints

use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{JobId, SpecificationId};
use fundflow_core::domain::job::{Job, JobType};
use fundflow_core::dto::job::{CreateJobResponse, JobSummary, ProviderIdsRequest};
use reqwest::StatusCode;
use tracing::debug;

use crate::FundingClient;
use crate::error::{ClientError, Result};

/// Result of a latest-job lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LatestJob {
    /// Most recent job matching the filter
    Found(Job),
    /// No job of the requested types exists for the specification
    None,
    /// Nothing changed since the previous lookup (HTTP 304)
    NotModified,
}

/// Result of a job-creating request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCreation {
    /// Backend created a job with this id
    Created(JobId),
    /// Backend reported there was nothing to do (HTTP 304)
    NotModified,
}

impl FundingClient {
    // =============================================================================
    // Job Status
    // =============================================================================

    /// Get the most recent job for a specification
    ///
    /// # Arguments
    /// * `specification_id` - The specification the jobs act on
    /// * `job_types` - Only jobs of these types are considered; empty means any
    pub async fn latest_job(
        &self,
        specification_id: &SpecificationId,
        job_types: &[JobType],
    ) -> Result<LatestJob> {
        let url = format!("{}/api/jobs/latest/{}", self.base_url, specification_id);
        let mut request = self.client.get(&url);
        if !job_types.is_empty() {
            let types = job_types
                .iter()
                .map(|t| t.wire_name())
                .collect::<Vec<_>>()
                .join(",");
            request = request.query(&[("jobTypes", types)]);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(LatestJob::None),
            StatusCode::NOT_MODIFIED => Ok(LatestJob::NotModified),
            _ => {
                let summary: JobSummary = self.handle_response(response).await?;
                let job = Job::try_from(summary)
                    .map_err(|e| ClientError::ParseError(format!("Invalid job record: {}", e)))?;
                Ok(LatestJob::Found(job))
            }
        }
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: &JobId) -> Result<Job> {
        let url = format!("{}/api/jobs/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        let summary: JobSummary = self.handle_response(response).await?;
        Job::try_from(summary)
            .map_err(|e| ClientError::ParseError(format!("Invalid job record: {}", e)))
    }

    // =============================================================================
    // Funding Actions
    // =============================================================================

    /// Issue the request that creates a job for a funding action
    ///
    /// Sends exactly one request and returns as soon as the backend has
    /// assigned a job id; it does not wait for the job to run.
    ///
    /// # Arguments
    /// * `action` - The funding action to perform
    /// * `specification_id` - The specification to act on
    /// * `payload` - Provider subset for batch actions, batch id for validation
    pub async fn create_job(
        &self,
        action: FundingAction,
        specification_id: &SpecificationId,
        payload: &ActionPayload,
    ) -> Result<JobCreation> {
        let base = format!("{}/api/specs/{}", self.base_url, specification_id);

        let request = match action {
            FundingAction::Refresh => self.client.post(format!("{}/funding/refresh", base)),
            FundingAction::ApproveAll => self.client.post(format!("{}/funding/approve", base)),
            FundingAction::PublishAll => self.client.post(format!("{}/funding/release", base)),
            FundingAction::ApproveBatch => self
                .client
                .post(format!("{}/funding/approve/providers", base))
                .json(&ProviderIdsRequest {
                    provider_ids: payload.provider_ids().to_vec(),
                }),
            FundingAction::PublishBatch => self
                .client
                .post(format!("{}/funding/release/providers", base))
                .json(&ProviderIdsRequest {
                    provider_ids: payload.provider_ids().to_vec(),
                }),
            FundingAction::BatchValidate => {
                let ActionPayload::Batch(batch_id) = payload else {
                    return Err(ClientError::InvalidRequest(
                        "Batch validation requires a batch id".to_string(),
                    ));
                };
                self.client
                    .post(format!("{}/batches/{}/validate", base, batch_id))
            }
        };

        debug!("Submitting {:?} for specification {}", action, specification_id);
        let response = request.send().await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(JobCreation::NotModified);
        }

        let created: CreateJobResponse = self.handle_response(response).await?;
        Ok(JobCreation::Created(created.job_id))
    }
}
