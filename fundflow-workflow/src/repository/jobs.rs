//! Jobs repository
//!
//! Handles communication with the backend for job-related operations:
//! - Fetching the latest job of a specification
//! - Fetching a single job by id
//! - Creating jobs for funding actions

use async_trait::async_trait;
use fundflow_client::{FundingClient, JobCreation, LatestJob, Result};
use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{JobId, SpecificationId};
use fundflow_core::domain::job::{Job, JobType};
use std::sync::Arc;

/// Repository trait for job-related operations with the backend
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetches the most recent job for a specification
    ///
    /// # Arguments
    /// * `specification_id` - The specification the jobs act on
    /// * `job_types` - Only jobs of these types are considered
    async fn latest_job(
        &self,
        specification_id: &SpecificationId,
        job_types: &[JobType],
    ) -> Result<LatestJob>;

    /// Fetches a single job by id
    async fn get_job(&self, job_id: &JobId) -> Result<Job>;

    /// Creates a job for a funding action
    ///
    /// Issues exactly one request. Calling twice creates two jobs.
    async fn create_job(
        &self,
        action: FundingAction,
        specification_id: &SpecificationId,
        payload: &ActionPayload,
    ) -> Result<JobCreation>;
}

/// HTTP implementation of JobRepository
pub struct HttpJobRepository {
    client: Arc<FundingClient>,
}

impl HttpJobRepository {
    /// Creates a new HTTP job repository
    pub fn new(client: Arc<FundingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn latest_job(
        &self,
        specification_id: &SpecificationId,
        job_types: &[JobType],
    ) -> Result<LatestJob> {
        self.client.latest_job(specification_id, job_types).await
    }

    async fn get_job(&self, job_id: &JobId) -> Result<Job> {
        self.client.get_job(job_id).await
    }

    async fn create_job(
        &self,
        action: FundingAction,
        specification_id: &SpecificationId,
        payload: &ActionPayload,
    ) -> Result<JobCreation> {
        self.client
            .create_job(action, specification_id, payload)
            .await
    }
}
