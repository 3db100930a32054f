//! Scripted in-memory repositories for tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fundflow_client::{ClientError, FieldError, JobCreation, LatestJob, Result};
use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{BatchId, JobId, ProviderId, SpecificationId};
use fundflow_core::domain::job::{Job, JobState, JobType};
use fundflow_core::domain::permission::Permission;

use crate::config::WorkflowConfig;
use crate::repository::{BatchFile, BatchRepository, JobRepository, PermissionRepository};

/// Fast polling, two failed polls tolerated
pub fn test_config() -> WorkflowConfig {
    WorkflowConfig::default()
        .with_poll_interval(Duration::from_millis(1))
        .with_max_poll_failures(2)
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

/// Snapshot of a job on specification S1, `secs` seconds after a fixed base time
pub fn job_at(id: &str, job_type: JobType, state: JobState, secs: i64) -> Job {
    Job {
        id: JobId::new(id),
        job_type,
        target_id: SpecificationId::new("S1"),
        state,
        outcome: None,
        superseded_by_job_id: None,
        batch_id: None,
        invoker: Some("test user".to_string()),
        status_timestamp: base_time() + chrono::Duration::seconds(secs),
    }
}

/// Validation job snapshot for a batch
pub fn validation_job(id: &str, batch: &str, state: JobState, secs: i64) -> Job {
    Job {
        batch_id: Some(BatchId::new(batch)),
        ..job_at(id, JobType::ValidateBatch, state, secs)
    }
}

enum Scripted<T> {
    Ok(T),
    Fail(ClientErrorKind),
}

#[derive(Clone)]
pub enum ClientErrorKind {
    Transport(String),
    Forbidden(String),
    Validation(Vec<FieldError>),
    Server(String),
}

impl ClientErrorKind {
    fn into_error(self) -> ClientError {
        match self {
            ClientErrorKind::Transport(msg) => ClientError::api_error(503, msg),
            ClientErrorKind::Forbidden(msg) => ClientError::Forbidden(msg),
            ClientErrorKind::Validation(errors) => ClientError::ValidationFailed(errors),
            ClientErrorKind::Server(msg) => ClientError::api_error(500, msg),
        }
    }
}

/// Job repository answering from scripted queues
///
/// When a queue runs dry the last successful answer is repeated, like a
/// backend whose job stopped changing.
pub struct FakeJobRepository {
    latest: Mutex<VecDeque<Scripted<LatestJob>>>,
    last_latest: Mutex<LatestJob>,
    jobs: Mutex<HashMap<JobId, VecDeque<Job>>>,
    last_jobs: Mutex<HashMap<JobId, Job>>,
    creations: Mutex<VecDeque<Scripted<JobCreation>>>,
    created: Mutex<Vec<(FundingAction, SpecificationId, ActionPayload)>>,
    latest_calls: Mutex<usize>,
    get_job_calls: Mutex<usize>,
}

impl FakeJobRepository {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(VecDeque::new()),
            last_latest: Mutex::new(LatestJob::None),
            jobs: Mutex::new(HashMap::new()),
            last_jobs: Mutex::new(HashMap::new()),
            creations: Mutex::new(VecDeque::new()),
            created: Mutex::new(Vec::new()),
            latest_calls: Mutex::new(0),
            get_job_calls: Mutex::new(0),
        }
    }

    pub fn push_latest(&self, job: Job) {
        self.push_latest_response(LatestJob::Found(job));
    }

    pub fn push_latest_response(&self, latest: LatestJob) {
        self.latest.lock().unwrap().push_back(Scripted::Ok(latest));
    }

    pub fn push_latest_failure(&self, message: &str) {
        self.latest
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(ClientErrorKind::Transport(message.to_string())));
    }

    pub fn push_latest_error(&self, kind: ClientErrorKind) {
        self.latest.lock().unwrap().push_back(Scripted::Fail(kind));
    }

    /// Queues a snapshot returned by `get_job` for its id
    pub fn push_job(&self, job: Job) {
        self.jobs
            .lock()
            .unwrap()
            .entry(job.id.clone())
            .or_default()
            .push_back(job);
    }

    pub fn push_creation(&self, creation: JobCreation) {
        self.creations
            .lock()
            .unwrap()
            .push_back(Scripted::Ok(creation));
    }

    pub fn push_creation_failure(&self, kind: ClientErrorKind) {
        self.creations.lock().unwrap().push_back(Scripted::Fail(kind));
    }

    pub fn created(&self) -> Vec<(FundingAction, SpecificationId, ActionPayload)> {
        self.created.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn latest_calls(&self) -> usize {
        *self.latest_calls.lock().unwrap()
    }

    pub fn get_job_calls(&self) -> usize {
        *self.get_job_calls.lock().unwrap()
    }
}

#[async_trait]
impl JobRepository for FakeJobRepository {
    async fn latest_job(
        &self,
        _specification_id: &SpecificationId,
        _job_types: &[JobType],
    ) -> Result<LatestJob> {
        *self.latest_calls.lock().unwrap() += 1;

        match self.latest.lock().unwrap().pop_front() {
            Some(Scripted::Ok(latest)) => {
                if !matches!(latest, LatestJob::NotModified) {
                    *self.last_latest.lock().unwrap() = latest.clone();
                }
                Ok(latest)
            }
            Some(Scripted::Fail(kind)) => Err(kind.into_error()),
            None => Ok(self.last_latest.lock().unwrap().clone()),
        }
    }

    async fn get_job(&self, job_id: &JobId) -> Result<Job> {
        *self.get_job_calls.lock().unwrap() += 1;

        let next = self
            .jobs
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(job) => {
                self.last_jobs
                    .lock()
                    .unwrap()
                    .insert(job_id.clone(), job.clone());
                Ok(job)
            }
            None => self
                .last_jobs
                .lock()
                .unwrap()
                .get(job_id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("job {}", job_id))),
        }
    }

    async fn create_job(
        &self,
        action: FundingAction,
        specification_id: &SpecificationId,
        payload: &ActionPayload,
    ) -> Result<JobCreation> {
        let call = {
            let mut created = self.created.lock().unwrap();
            created.push((action, specification_id.clone(), payload.clone()));
            created.len()
        };

        match self.creations.lock().unwrap().pop_front() {
            Some(Scripted::Ok(creation)) => Ok(creation),
            Some(Scripted::Fail(kind)) => Err(kind.into_error()),
            None => Ok(JobCreation::Created(JobId::new(format!("J{}", call)))),
        }
    }
}

/// Batch repository with one scripted upload answer and fixed id lists
pub struct FakeBatchRepository {
    upload: Mutex<Option<Scripted<BatchId>>>,
    ids: Mutex<HashMap<BatchId, Vec<ProviderId>>>,
    uploads: Mutex<Vec<BatchFile>>,
    id_requests: Mutex<Vec<BatchId>>,
}

impl FakeBatchRepository {
    pub fn new() -> Self {
        Self {
            upload: Mutex::new(None),
            ids: Mutex::new(HashMap::new()),
            uploads: Mutex::new(Vec::new()),
            id_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_upload(batch_id: &str) -> Self {
        let repo = Self::new();
        *repo.upload.lock().unwrap() = Some(Scripted::Ok(BatchId::new(batch_id)));
        repo
    }

    pub fn fail_upload(&self, kind: ClientErrorKind) {
        *self.upload.lock().unwrap() = Some(Scripted::Fail(kind));
    }

    pub fn set_ids(&self, batch_id: &str, ids: &[&str]) {
        self.ids.lock().unwrap().insert(
            BatchId::new(batch_id),
            ids.iter().map(|id| ProviderId::new(*id)).collect(),
        );
    }

    pub fn uploads(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn id_requests(&self) -> Vec<BatchId> {
        self.id_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchRepository for FakeBatchRepository {
    async fn upload_file(&self, file: &BatchFile) -> Result<BatchId> {
        self.uploads.lock().unwrap().push(file.clone());

        match self.upload.lock().unwrap().as_ref() {
            Some(Scripted::Ok(batch_id)) => Ok(batch_id.clone()),
            Some(Scripted::Fail(kind)) => Err(kind.clone().into_error()),
            None => Err(ClientError::InvalidRequest("no upload scripted".to_string())),
        }
    }

    async fn ids_for_batch(&self, batch_id: &BatchId) -> Result<Vec<ProviderId>> {
        self.id_requests.lock().unwrap().push(batch_id.clone());

        self.ids
            .lock()
            .unwrap()
            .get(batch_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("batch {}", batch_id)))
    }
}

/// Permission lookup backed by a fixed grant set
pub struct FakePermissions {
    granted: Mutex<HashSet<Permission>>,
    lookups: Mutex<usize>,
}

impl FakePermissions {
    pub fn granting(permissions: &[Permission]) -> Self {
        Self {
            granted: Mutex::new(permissions.iter().copied().collect()),
            lookups: Mutex::new(0),
        }
    }

    pub fn all() -> Self {
        Self::granting(&[
            Permission::CanRefreshFunding,
            Permission::CanApproveFunding,
            Permission::CanReleaseFunding,
            Permission::CanUploadBatch,
        ])
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl PermissionRepository for FakePermissions {
    async fn has_permission(
        &self,
        _specification_id: &SpecificationId,
        permission: Permission,
    ) -> Result<bool> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.granted.lock().unwrap().contains(&permission))
    }
}
