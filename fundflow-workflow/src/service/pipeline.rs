//! Batch upload pipeline
//!
//! Uploads a batch file, creates a validation job for it, waits for the job
//! and extracts the provider ids the batch resolved to:
//!
//! `Idle -> Uploading -> CreatingValidationJob -> WaitingForJob -> ExtractingIds -> Ready`
//!
//! Any step can end in `Failed`. Ids are only extracted for a validation job
//! that succeeded for this session's batch.

use std::sync::Arc;

use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{BatchId, JobId, ProviderId, SpecificationId};
use fundflow_core::domain::job::{JobOutcome, JobType};
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::error::PipelineError;
use crate::monitor::{FinishedJob, JobMonitor};
use crate::repository::{BatchFile, BatchRepository, JobRepository};
use crate::service::submitter::{ActionSubmitter, Submission};

/// Phase of a batch upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Uploading,
    CreatingValidationJob,
    WaitingForJob,
    ExtractingIds,
    Ready,
    Failed,
}

/// Everything learned about the current upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchUploadSession {
    pub file_name: String,
    pub batch_id: Option<BatchId>,
    pub validation_job_id: Option<JobId>,
    pub extracted_ids: Vec<ProviderId>,
}

/// A validated batch, ready for a confirmation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyBatch {
    pub batch_id: BatchId,
    pub provider_ids: Vec<ProviderId>,
}

/// Runs batch uploads for one specification
pub struct BatchUploadPipeline {
    target_id: SpecificationId,
    jobs: Arc<dyn JobRepository>,
    batches: Arc<dyn BatchRepository>,
    submitter: ActionSubmitter,
    config: WorkflowConfig,
    state: PipelineState,
    session: BatchUploadSession,
    error: Option<String>,
}

impl BatchUploadPipeline {
    pub fn new(
        target_id: SpecificationId,
        jobs: Arc<dyn JobRepository>,
        batches: Arc<dyn BatchRepository>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            target_id,
            submitter: ActionSubmitter::new(jobs.clone()),
            jobs,
            batches,
            config,
            state: PipelineState::Idle,
            session: BatchUploadSession::default(),
            error: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn session(&self) -> &BatchUploadSession {
        &self.session
    }

    /// Message of the failure that ended the last run
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Runs a full upload for `file`
    ///
    /// Starting a new run discards the previous session, so ids from an
    /// earlier upload can never leak into this one.
    pub async fn run(&mut self, file: BatchFile) -> Result<ReadyBatch, PipelineError> {
        self.session = BatchUploadSession {
            file_name: file.name.clone(),
            ..Default::default()
        };
        self.error = None;

        let result = self.execute(&file).await;

        if let Err(e) = &result {
            warn!("Batch upload of '{}' failed: {}", file.name, e);
            self.state = PipelineState::Failed;
            self.error = Some(e.to_string());
        }

        result
    }

    async fn execute(&mut self, file: &BatchFile) -> Result<ReadyBatch, PipelineError> {
        self.transition(PipelineState::Uploading);
        let batch_id = self
            .batches
            .upload_file(file)
            .await
            .map_err(PipelineError::Upload)?;
        info!("Uploaded '{}' as batch {}", file.name, batch_id);
        self.session.batch_id = Some(batch_id.clone());

        self.transition(PipelineState::CreatingValidationJob);
        let submission = self
            .submitter
            .submit(
                FundingAction::BatchValidate,
                &self.target_id,
                &ActionPayload::Batch(batch_id.clone()),
            )
            .await
            .map_err(PipelineError::CreateValidationJob)?;
        let job_id = match submission {
            Submission::Created(job_id) => job_id,
            Submission::NoChangeNeeded => return Err(PipelineError::NoValidationJob(batch_id)),
        };
        self.session.validation_job_id = Some(job_id.clone());

        self.transition(PipelineState::WaitingForJob);
        let mut monitor = JobMonitor::watch(
            self.jobs.clone(),
            self.target_id.clone(),
            [JobType::ValidateBatch],
            &self.config,
        );
        monitor.track(job_id.clone());
        let finished = monitor.wait_for_tracked().await?;
        accept_validation(&finished, &batch_id, &job_id)?;

        self.transition(PipelineState::ExtractingIds);
        let provider_ids = self
            .batches
            .ids_for_batch(&batch_id)
            .await
            .map_err(|source| PipelineError::ExtractIds {
                batch_id: batch_id.clone(),
                source,
            })?;
        info!(
            "Batch {} resolved to {} provider(s)",
            batch_id,
            provider_ids.len()
        );
        self.session.extracted_ids = provider_ids.clone();

        self.transition(PipelineState::Ready);
        Ok(ReadyBatch {
            batch_id,
            provider_ids,
        })
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Batch pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Decides whether a finished validation job may release the batch's ids
///
/// Only a succeeded job with the submitted id, for the session's batch,
/// passes.
fn accept_validation(
    finished: &FinishedJob,
    batch_id: &BatchId,
    job_id: &JobId,
) -> Result<(), PipelineError> {
    let job = &finished.job;
    let mismatch = || PipelineError::BatchMismatch {
        job_id: job.id.clone(),
        expected: batch_id.clone(),
    };

    if &job.id != job_id {
        return Err(mismatch());
    }

    match &finished.outcome {
        JobOutcome::Failed { message, .. } => Err(PipelineError::ValidationFailed {
            job_id: job.id.clone(),
            message: message.clone(),
        }),
        JobOutcome::Superseded { by } => Err(PipelineError::Superseded {
            job_id: job.id.clone(),
            by: by.clone(),
        }),
        JobOutcome::Succeeded if job.batch_id.as_ref() != Some(batch_id) => Err(mismatch()),
        JobOutcome::Succeeded => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ClientErrorKind, FakeBatchRepository, FakeJobRepository, test_config, validation_job,
    };
    use fundflow_client::JobCreation;
    use fundflow_core::domain::job::{CompletionStatus, JobState};

    struct Fixture {
        jobs: Arc<FakeJobRepository>,
        batches: Arc<FakeBatchRepository>,
        pipeline: BatchUploadPipeline,
    }

    fn fixture(batch_id: &str) -> Fixture {
        let jobs = Arc::new(FakeJobRepository::new());
        let batches = Arc::new(FakeBatchRepository::with_upload(batch_id));
        jobs.push_creation(JobCreation::Created(JobId::new("J2")));

        let pipeline = BatchUploadPipeline::new(
            SpecificationId::new("S1"),
            jobs.clone(),
            batches.clone(),
            test_config(),
        );
        Fixture {
            jobs,
            batches,
            pipeline,
        }
    }

    fn batch_file() -> BatchFile {
        BatchFile::new("batch.xlsx", b"provider ids".to_vec())
    }

    #[tokio::test]
    async fn test_failed_validation_surfaces_outcome() {
        let mut f = fixture("B1");
        let mut failed = validation_job(
            "J2",
            "B1",
            JobState::Completed(CompletionStatus::Failed),
            2,
        );
        failed.outcome = Some("2 rows invalid".to_string());
        f.jobs
            .push_latest(validation_job("J2", "B1", JobState::InProgress, 1));
        f.jobs.push_latest(failed);

        let err = f.pipeline.run(batch_file()).await.unwrap_err();

        assert_eq!(err.to_string(), "2 rows invalid");
        assert_eq!(f.pipeline.state(), PipelineState::Failed);
        assert_eq!(f.pipeline.error(), Some("2 rows invalid"));
        assert!(f.pipeline.session().extracted_ids.is_empty());
        assert!(f.batches.id_requests().is_empty());
    }

    #[tokio::test]
    async fn test_succeeded_validation_extracts_ids_once() {
        let mut f = fixture("B1");
        f.batches.set_ids("B1", &["P1", "P2"]);
        f.jobs
            .push_latest(validation_job("J2", "B1", JobState::Queued, 1));
        f.jobs.push_latest(validation_job(
            "J2",
            "B1",
            JobState::Completed(CompletionStatus::Succeeded),
            2,
        ));

        let ready = f.pipeline.run(batch_file()).await.unwrap();

        assert_eq!(ready.batch_id, BatchId::new("B1"));
        assert_eq!(
            ready.provider_ids,
            vec![ProviderId::new("P1"), ProviderId::new("P2")]
        );
        assert_eq!(f.batches.uploads(), 1);
        assert_eq!(f.batches.id_requests(), vec![BatchId::new("B1")]);
        assert_eq!(f.pipeline.state(), PipelineState::Ready);
        assert_eq!(f.pipeline.session().extracted_ids, ready.provider_ids);
        assert_eq!(
            f.pipeline.session().validation_job_id,
            Some(JobId::new("J2"))
        );

        let created = f.jobs.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, FundingAction::BatchValidate);
        assert_eq!(created[0].2, ActionPayload::Batch(BatchId::new("B1")));
    }

    #[tokio::test]
    async fn test_superseded_validation_fails() {
        let mut f = fixture("B1");
        f.batches.set_ids("B1", &["P1"]);
        f.jobs.push_latest(validation_job(
            "J2",
            "B1",
            JobState::Completed(CompletionStatus::Superseded),
            1,
        ));

        let err = f.pipeline.run(batch_file()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Superseded { .. }));
        assert_eq!(f.pipeline.state(), PipelineState::Failed);
        assert!(f.batches.id_requests().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_batch_is_not_extracted() {
        let mut f = fixture("B1");
        f.batches.set_ids("B0", &["P9"]);
        f.batches.set_ids("B1", &["P1"]);
        f.jobs.push_latest(validation_job(
            "J2",
            "B0",
            JobState::Completed(CompletionStatus::Succeeded),
            1,
        ));

        let err = f.pipeline.run(batch_file()).await.unwrap_err();

        assert!(matches!(err, PipelineError::BatchMismatch { .. }));
        assert!(f.batches.id_requests().is_empty());
        assert!(f.pipeline.session().extracted_ids.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_stops_before_job_creation() {
        let mut f = fixture("B1");
        f.batches
            .fail_upload(ClientErrorKind::Server("disk full".to_string()));

        let err = f.pipeline.run(batch_file()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Upload(_)));
        assert_eq!(f.pipeline.state(), PipelineState::Failed);
        assert_eq!(f.jobs.create_calls(), 0);
        assert_eq!(f.pipeline.session().batch_id, None);
    }

    #[tokio::test]
    async fn test_validation_job_creation_failure() {
        let jobs = Arc::new(FakeJobRepository::new());
        jobs.push_creation_failure(ClientErrorKind::Forbidden("no upload rights".to_string()));
        let batches = Arc::new(FakeBatchRepository::with_upload("B1"));
        let mut pipeline = BatchUploadPipeline::new(
            SpecificationId::new("S1"),
            jobs.clone(),
            batches.clone(),
            test_config(),
        );

        let err = pipeline.run(batch_file()).await.unwrap_err();

        assert!(matches!(err, PipelineError::CreateValidationJob(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(pipeline.session().batch_id, Some(BatchId::new("B1")));
        assert_eq!(jobs.latest_calls(), 0);
    }

    #[tokio::test]
    async fn test_new_run_discards_previous_session() {
        let mut f = fixture("B1");
        f.batches.set_ids("B1", &["P1"]);
        f.jobs.push_latest(validation_job(
            "J2",
            "B1",
            JobState::Completed(CompletionStatus::Succeeded),
            1,
        ));
        f.pipeline.run(batch_file()).await.unwrap();

        f.batches
            .fail_upload(ClientErrorKind::Transport("offline".to_string()));
        f.pipeline.run(batch_file()).await.unwrap_err();

        assert!(f.pipeline.session().extracted_ids.is_empty());
        assert_eq!(f.pipeline.session().validation_job_id, None);
    }

    #[tokio::test]
    async fn test_monitor_failure_fails_pipeline() {
        let mut f = fixture("B1");
        f.jobs.push_latest_failure("offline");
        f.jobs.push_latest_failure("offline");
        f.jobs.push_latest_failure("offline");

        let err = f.pipeline.run(batch_file()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Monitor(_)));
        assert_eq!(f.pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_accept_validation_requires_submitted_job() {
        let job = validation_job(
            "J3",
            "B1",
            JobState::Completed(CompletionStatus::Succeeded),
            1,
        );
        let finished = FinishedJob {
            job,
            outcome: JobOutcome::Succeeded,
        };

        assert!(accept_validation(&finished, &BatchId::new("B1"), &JobId::new("J3")).is_ok());
        assert!(matches!(
            accept_validation(&finished, &BatchId::new("B1"), &JobId::new("J2")),
            Err(PipelineError::BatchMismatch { .. })
        ));
    }
}
