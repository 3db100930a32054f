//! Action submission
//!
//! Issues the single job-creating request behind a confirmed funding
//! action. Preventing duplicate submissions is the workflow's concern; a
//! second call here always creates a second job.

use std::sync::Arc;

use fundflow_client::{ClientError, JobCreation};
use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{JobId, SpecificationId};
use tracing::{info, warn};

use crate::error::SubmitError;
use crate::repository::JobRepository;

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The backend created a job
    Created(JobId),
    /// The backend reported nothing needed to change
    NoChangeNeeded,
}

/// Creates jobs for funding actions
#[derive(Clone)]
pub struct ActionSubmitter {
    repository: Arc<dyn JobRepository>,
}

impl ActionSubmitter {
    pub fn new(repository: Arc<dyn JobRepository>) -> Self {
        Self { repository }
    }

    /// Submits an action and returns as soon as the job id is known
    ///
    /// # Arguments
    /// * `action` - The funding action to perform
    /// * `target_id` - The specification to act on
    /// * `payload` - Provider subset or batch id, when the action needs one
    pub async fn submit(
        &self,
        action: FundingAction,
        target_id: &SpecificationId,
        payload: &ActionPayload,
    ) -> Result<Submission, SubmitError> {
        info!(
            "Submitting '{}' for specification {} ({} provider(s))",
            action,
            target_id,
            payload.provider_ids().len()
        );

        match self.repository.create_job(action, target_id, payload).await {
            Ok(JobCreation::Created(job_id)) => {
                info!("Backend created job {} for '{}'", job_id, action);
                Ok(Submission::Created(job_id))
            }
            Ok(JobCreation::NotModified) | Err(ClientError::NotModified) => {
                info!("No change needed for '{}' on {}", action, target_id);
                Ok(Submission::NoChangeNeeded)
            }
            Err(ClientError::Forbidden(message)) => {
                warn!("'{}' forbidden on {}: {}", action, target_id, message);
                Err(SubmitError::Forbidden { action, message })
            }
            Err(ClientError::ValidationFailed(errors)) => {
                warn!("'{}' rejected with {} validation error(s)", action, errors.len());
                Err(SubmitError::ValidationFailed { action, errors })
            }
            Err(source) => {
                warn!("Failed to submit '{}': {}", action, source);
                Err(SubmitError::SubmissionFailed { action, source })
            }
        }
    }
}
