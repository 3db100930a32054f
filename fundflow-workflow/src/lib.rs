//! Fundflow Workflow
//!
//! Client-side orchestration of long-running funding jobs.
//!
//! Architecture:
//! - Configuration: polling and redirect settings from environment or defaults
//! - Repositories: trait-based access to the funding backend (jobs, batches, permissions)
//! - Monitor: polls the latest job of a specification and tracks submitted jobs
//! - Services: action submission and the batch upload pipeline
//! - Workflow: the per-page state machine that sequences intent, submission and tracking
//!
//! Everything here only observes backend jobs. A workflow submits at most one
//! job per session and reacts only to the job it submitted.

pub mod config;
pub mod error;
pub mod monitor;
pub mod repository;
pub mod service;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkflowConfig;
pub use error::{MonitorError, PipelineError, SubmitError, UiError, WorkflowError};
pub use monitor::{FinishedJob, JobMonitor, JobStatusView, MonitorEvent};
pub use service::{
    ActionSubmitter, BatchUploadPipeline, BatchUploadSession, PipelineState, ReadyBatch,
    Submission,
};
pub use workflow::{
    ActionIntent, ActionSession, BatchActionKind, ConfirmationSummary, FundingScope,
    FundingWorkflow, WorkflowEvent, WorkflowState,
};
