//! Error types for funding workflows
//!
//! Each layer has its own error enum. `WorkflowError` is the one the host
//! sees; `UiError` is its render-ready form.

use fundflow_client::{ClientError, FieldError};
use fundflow_core::domain::action::FundingAction;
use fundflow_core::domain::id::{BatchId, JobId, SpecificationId};
use thiserror::Error;

use crate::workflow::WorkflowState;

/// Errors raised while creating a job
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The user is not allowed to perform the action
    #[error("Not permitted to {action}: {message}")]
    Forbidden {
        action: FundingAction,
        message: String,
    },

    /// The backend rejected the request content
    #[error("{action} was rejected: {}", describe_fields(.errors))]
    ValidationFailed {
        action: FundingAction,
        errors: Vec<FieldError>,
    },

    /// Any other failure, including transport errors
    #[error("Failed to submit {action}: {source}")]
    SubmissionFailed {
        action: FundingAction,
        #[source]
        source: ClientError,
    },
}

/// Monitor-level failure, distinct from a job failing on the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Unable to check job status after {attempts} attempts: {last_error}")]
    PollingFailed { attempts: u32, last_error: String },

    /// The backend answered with an error that retrying will not fix
    #[error("Unable to check job status: {0}")]
    Rejected(String),

    #[error("No job is being tracked")]
    NotTracking,
}

/// Errors raised by the batch upload pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to upload batch file: {0}")]
    Upload(#[source] ClientError),

    #[error("Failed to create validation job: {0}")]
    CreateValidationJob(#[source] SubmitError),

    #[error("Backend did not create a validation job for batch {0}")]
    NoValidationJob(BatchId),

    /// Validation job failed, was cancelled or timed out
    #[error("{message}")]
    ValidationFailed { job_id: JobId, message: String },

    #[error("Validation job {job_id} was superseded{}", superseded_suffix(.by))]
    Superseded { job_id: JobId, by: Option<JobId> },

    /// The finished job belongs to a different upload
    #[error("Validation job {job_id} does not belong to batch {expected}")]
    BatchMismatch { job_id: JobId, expected: BatchId },

    #[error("Failed to load providers for batch {batch_id}: {source}")]
    ExtractIds {
        batch_id: BatchId,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Errors surfaced by a funding workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Not permitted: {0}")]
    PermissionDenied(String),

    #[error("Validation failed: {}", describe_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    #[error("{0}")]
    SubmissionFailed(String),

    /// The tracked job reached a terminal state other than success
    #[error("{message}")]
    JobFailed { job_id: JobId, message: String },

    /// Another job is running on the specification
    #[error("{0}")]
    ActiveJobInProgress(String),

    /// No job status has been received for the specification yet
    #[error("Job status for specification {0} is not known yet")]
    JobStatusUnknown(SpecificationId),

    #[error("Cannot {operation} while {state:?}")]
    InvalidTransition {
        state: WorkflowState,
        operation: &'static str,
    },

    #[error("Unable to check permissions: {0}")]
    PermissionLookup(#[source] ClientError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Batch(#[from] PipelineError),
}

impl From<SubmitError> for WorkflowError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Forbidden { .. } => WorkflowError::PermissionDenied(err.to_string()),
            SubmitError::ValidationFailed { errors, .. } => WorkflowError::ValidationFailed(errors),
            SubmitError::SubmissionFailed { .. } => {
                WorkflowError::SubmissionFailed(err.to_string())
            }
        }
    }
}

impl WorkflowError {
    /// Render-ready messages; validation errors keep their field names
    pub fn to_ui_errors(&self) -> Vec<UiError> {
        match self {
            WorkflowError::ValidationFailed(errors) => errors
                .iter()
                .map(|e| UiError {
                    message: e.message.clone(),
                    field_name: e.field.clone(),
                })
                .collect(),
            other => vec![UiError::new(other.to_string())],
        }
    }
}

/// An error entry the host renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub message: String,
    pub field_name: Option<String>,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_name: None,
        }
    }
}

fn superseded_suffix(by: &Option<JobId>) -> String {
    by.as_ref()
        .map(|id| format!(" by job {}", id))
        .unwrap_or_default()
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) => format!("{}: {}", field, e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
