//! Funding workflow state machine
//!
//! Sequences user intent, submission and job tracking for one specification:
//!
//! `Idle -> ActionRequested -> Confirming -> JobRunning -> Complete`
//!
//! `Error` is reachable from every non-terminal state. All transitions are
//! applied synchronously on `&mut self`, so two ticks can never interleave on
//! one session, and a session submits at most one job.

mod session;

pub use session::{
    ActionIntent, ActionSession, BatchActionKind, ConfirmationSummary, FundingScope,
    WorkflowEvent, WorkflowState,
};

use std::sync::Arc;

use fundflow_core::domain::id::SpecificationId;
use fundflow_core::domain::job::{JobOutcome, JobType};
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, warn};

use crate::config::WorkflowConfig;
use crate::error::{PipelineError, UiError, WorkflowError};
use crate::monitor::{FinishedJob, JobMonitor, JobStatusView, MonitorEvent};
use crate::repository::{JobRepository, PermissionRepository};
use crate::service::{ActionSubmitter, ReadyBatch, Submission};

/// Per-page controller for funding actions on one specification
pub struct FundingWorkflow {
    target_id: SpecificationId,
    jobs: Arc<dyn JobRepository>,
    permissions: Arc<dyn PermissionRepository>,
    submitter: ActionSubmitter,
    monitor: JobMonitor,
    config: WorkflowConfig,
    session: Option<ActionSession>,
    errors: Vec<UiError>,
}

impl FundingWorkflow {
    /// Mounts a workflow on a specification
    ///
    /// The workflow watches every funding job type, so a job started by
    /// anyone on the same specification blocks new actions.
    pub fn new(
        target_id: SpecificationId,
        jobs: Arc<dyn JobRepository>,
        permissions: Arc<dyn PermissionRepository>,
        config: WorkflowConfig,
    ) -> Self {
        let monitor = JobMonitor::watch(
            jobs.clone(),
            target_id.clone(),
            JobType::FUNDING_ACTIONS,
            &config,
        );

        Self {
            target_id,
            submitter: ActionSubmitter::new(jobs.clone()),
            jobs,
            permissions,
            monitor,
            config,
            session: None,
            errors: Vec::new(),
        }
    }

    pub fn target_id(&self) -> &SpecificationId {
        &self.target_id
    }

    pub fn state(&self) -> WorkflowState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(WorkflowState::Idle)
    }

    pub fn session(&self) -> Option<&ActionSession> {
        self.session.as_ref()
    }

    /// Derived job flags for the specification
    pub fn monitor_status(&self) -> JobStatusView {
        self.monitor.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobStatusView> {
        self.monitor.subscribe()
    }

    /// Errors to render, in the order they occurred
    pub fn errors(&self) -> &[UiError] {
        &self.errors
    }

    /// Whether the action controls should be enabled
    ///
    /// Controls stay disabled until the first job status has arrived.
    pub fn can_submit(&self) -> bool {
        let view = self.monitor.status();
        matches!(self.state(), WorkflowState::Idle | WorkflowState::Error)
            && !view.is_checking_for_job
            && !view.has_active_job
    }

    // =============================================================================
    // Transitions
    // =============================================================================

    /// Idle/Error -> ActionRequested
    ///
    /// Rejected without changing state before the first job status has
    /// arrived, while any funding job is active on the specification, or
    /// when the user lacks the action's permission.
    pub async fn request_action(&mut self, intent: ActionIntent) -> Result<(), WorkflowError> {
        let state = self.state();
        if !matches!(state, WorkflowState::Idle | WorkflowState::Error) {
            return Err(WorkflowError::InvalidTransition {
                state,
                operation: "request an action",
            });
        }

        let view = self.monitor.status();
        if view.is_checking_for_job {
            info!(
                "Rejected '{}' on {}: no job status yet",
                intent.action(),
                self.target_id
            );
            return Err(WorkflowError::JobStatusUnknown(self.target_id.clone()));
        }
        if view.has_active_job {
            let message = view
                .job_in_progress_message
                .unwrap_or_else(|| "Another job is in progress".to_string());
            info!(
                "Rejected '{}' on {}: {}",
                intent.action(),
                self.target_id,
                message
            );
            return Err(WorkflowError::ActiveJobInProgress(message));
        }

        let permission = intent.action().required_permission();
        match self
            .permissions
            .has_permission(&self.target_id, permission)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                let err = WorkflowError::PermissionDenied(format!(
                    "{} is required on specification {}",
                    permission, self.target_id
                ));
                warn!("{}", err);
                self.errors.extend(err.to_ui_errors());
                return Err(err);
            }
            Err(e) => {
                let err = WorkflowError::PermissionLookup(e);
                warn!("{}", err);
                self.errors.extend(err.to_ui_errors());
                return Err(err);
            }
        }

        let session = ActionSession::new(intent);
        info!(
            "Session {} requested '{}' on {}",
            session.id,
            session.intent.action(),
            self.target_id
        );
        self.errors.clear();
        self.session = Some(session);
        Ok(())
    }

    /// Error -> ActionRequested with the failed session's intent
    ///
    /// A batch action that failed before its providers were known cannot be
    /// retried; the batch has to be uploaded again.
    pub async fn retry(&mut self) -> Result<(), WorkflowError> {
        let intent = match &self.session {
            Some(session)
                if session.intent.action().is_batch()
                    && session.intent.payload().provider_ids().is_empty() =>
            {
                return Err(WorkflowError::InvalidTransition {
                    state: session.state,
                    operation: "retry a batch action without providers",
                });
            }
            Some(session) if session.state == WorkflowState::Error => session.intent.clone(),
            _ => {
                return Err(WorkflowError::InvalidTransition {
                    state: self.state(),
                    operation: "retry",
                });
            }
        };

        self.request_action(intent).await
    }

    /// ActionRequested -> Confirming; no network effect
    pub fn show_confirmation(&mut self) -> Result<ConfirmationSummary, WorkflowError> {
        let state = self.state();
        let session = self
            .session
            .as_mut()
            .filter(|s| s.state == WorkflowState::ActionRequested)
            .ok_or(WorkflowError::InvalidTransition {
                state,
                operation: "show the confirmation",
            })?;

        session.state = WorkflowState::Confirming;
        Ok(ConfirmationSummary {
            action: session.intent.action(),
            target_id: self.target_id.clone(),
            provider_ids: session.intent.payload().provider_ids().to_vec(),
        })
    }

    /// Confirming -> JobRunning
    ///
    /// Submits the session's action exactly once. Any confirmation outside
    /// `Confirming` is rejected before reaching the backend. A "no change
    /// needed" answer completes the session immediately.
    pub async fn confirm(&mut self) -> Result<Option<WorkflowEvent>, WorkflowError> {
        let state = self.state();
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == WorkflowState::Confirming)
        else {
            return Err(WorkflowError::InvalidTransition {
                state,
                operation: "confirm",
            });
        };

        // Marked before the request so a re-entrant confirm can never submit again
        session.state = WorkflowState::JobRunning;
        let action = session.intent.action();
        let payload = session.intent.payload();

        match self.submitter.submit(action, &self.target_id, &payload).await {
            Ok(Submission::Created(job_id)) => {
                if let Some(session) = self.session.as_mut() {
                    session.submitted_job_id = Some(job_id.clone());
                }
                self.monitor.track(job_id);
                Ok(None)
            }
            Ok(Submission::NoChangeNeeded) => Ok(Some(self.complete())),
            Err(e) => {
                let err = WorkflowError::from(e);
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Applies one monitor tick
    ///
    /// Returns an event only when the tracked job's outcome moves the session
    /// to `Complete` or `Error`; this happens once per session.
    pub async fn poll(&mut self) -> Option<WorkflowEvent> {
        let was_failing = self.monitor.status().monitor_error.is_some();
        let result = self.monitor.poll_once().await;

        if self.state() != WorkflowState::JobRunning {
            // Reported once per outage
            if let Err(e) = result {
                if !was_failing {
                    warn!("{}", e);
                    self.errors.push(UiError::new(e.to_string()));
                }
            }
            return None;
        }

        match result {
            Ok(MonitorEvent::TrackedJobFinished(finished)) => self.on_tracked_finished(finished),
            Ok(_) => None,
            Err(e) => Some(self.fail(&WorkflowError::Monitor(e))),
        }
    }

    /// Polls on the configured interval until the running job settles
    pub async fn run_until_settled(&mut self) -> Result<WorkflowEvent, WorkflowError> {
        let state = self.state();
        if state != WorkflowState::JobRunning {
            return Err(WorkflowError::InvalidTransition {
                state,
                operation: "wait for a job",
            });
        }

        let mut interval = time::interval(self.config.poll_interval);
        loop {
            interval.tick().await;

            if let Some(event) = self.poll().await {
                return Ok(event);
            }
        }
    }

    /// Back to Idle before anything was submitted, or after an error
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        match self.state() {
            WorkflowState::Idle => Ok(()),
            WorkflowState::ActionRequested | WorkflowState::Confirming | WorkflowState::Error => {
                if let Some(session) = self.session.take() {
                    info!("Session {} cancelled", session.id);
                }
                self.errors.clear();
                Ok(())
            }
            state @ (WorkflowState::JobRunning | WorkflowState::Complete) => {
                Err(WorkflowError::InvalidTransition {
                    state,
                    operation: "cancel",
                })
            }
        }
    }

    /// Upload-then-act: moves a validated batch straight to confirmation
    ///
    /// Takes the outcome of a `BatchUploadPipeline` run. A failed upload or
    /// validation ends in `Error` with the pipeline's message attached to
    /// `errors`.
    pub async fn prepare_batch_action(
        &mut self,
        kind: BatchActionKind,
        batch: Result<ReadyBatch, PipelineError>,
    ) -> Result<ConfirmationSummary, WorkflowError> {
        let state = self.state();
        if !matches!(state, WorkflowState::Idle | WorkflowState::Error) {
            return Err(WorkflowError::InvalidTransition {
                state,
                operation: "prepare a batch action",
            });
        }

        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                let session = ActionSession::new(kind.intent(Vec::new()));
                info!("Session {} started from a failed batch upload", session.id);
                self.errors.clear();
                self.session = Some(session);
                let err = WorkflowError::Batch(e);
                self.fail(&err);
                return Err(err);
            }
        };

        info!(
            "Preparing {:?} for {} provider(s) from batch {}",
            kind,
            batch.provider_ids.len(),
            batch.batch_id
        );
        self.request_action(kind.intent(batch.provider_ids)).await?;
        self.show_confirmation()
    }

    /// Re-targets the workflow
    ///
    /// The current watch is dropped and a new one created; any session is
    /// abandoned. A job already submitted keeps running on the backend.
    pub fn change_target(&mut self, target_id: SpecificationId) {
        if target_id == self.target_id {
            return;
        }

        info!(
            "Switching workflow from specification {} to {}",
            self.target_id, target_id
        );
        self.abandon_session();
        self.monitor = JobMonitor::watch(
            self.jobs.clone(),
            target_id.clone(),
            JobType::FUNDING_ACTIONS,
            &self.config,
        );
        self.target_id = target_id;
        self.errors.clear();
    }

    /// Tears the workflow down when its view goes away
    pub fn unmount(mut self) {
        self.abandon_session();
        info!("Workflow for specification {} unmounted", self.target_id);
    }

    // =============================================================================
    // Internals
    // =============================================================================

    fn on_tracked_finished(&mut self, finished: FinishedJob) -> Option<WorkflowEvent> {
        let submitted = self
            .session
            .as_ref()
            .and_then(|s| s.submitted_job_id.as_ref());
        if submitted != Some(&finished.job.id) {
            warn!(
                "Ignoring outcome of job {} which this session did not submit",
                finished.job.id
            );
            return None;
        }

        let job_id = finished.job.id;
        match finished.outcome {
            JobOutcome::Succeeded => Some(self.complete()),
            JobOutcome::Failed { message, .. } => {
                Some(self.fail(&WorkflowError::JobFailed { job_id, message }))
            }
            JobOutcome::Superseded { by } => {
                let message = match by {
                    Some(by) => format!("Job {} was superseded by job {}", job_id, by),
                    None => format!("Job {} was superseded", job_id),
                };
                Some(self.fail(&WorkflowError::JobFailed { job_id, message }))
            }
        }
    }

    fn complete(&mut self) -> WorkflowEvent {
        let redirect = self.config.results_path_for(&self.target_id);
        let job_id = self
            .session
            .as_mut()
            .and_then(|session| {
                session.state = WorkflowState::Complete;
                session.submitted_job_id.clone()
            });

        info!(
            "Funding action on {} complete, redirecting to {}",
            self.target_id, redirect
        );
        WorkflowEvent::Completed { job_id, redirect }
    }

    fn fail(&mut self, err: &WorkflowError) -> WorkflowEvent {
        if let Some(session) = self.session.as_mut() {
            session.state = WorkflowState::Error;
        }
        error!("Funding action on {} failed: {}", self.target_id, err);
        self.errors.extend(err.to_ui_errors());

        WorkflowEvent::Failed {
            message: err.to_string(),
        }
    }

    fn abandon_session(&mut self) {
        if let Some(session) = self.session.take() {
            match (&session.submitted_job_id, session.state) {
                (Some(job_id), WorkflowState::JobRunning) => info!(
                    "Session {} abandoned; job {} continues on the backend",
                    session.id, job_id
                ),
                _ => info!("Session {} abandoned", session.id),
            }
        }
        self.monitor.untrack();
    }
}
