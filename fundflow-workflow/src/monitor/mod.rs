//! Job monitor
//!
//! Watches the latest job of a specification, filtered by job type, and
//! optionally tracks one specific job id to its terminal state.
//!
//! The monitor is transport agnostic: each call to [`JobMonitor::poll_once`]
//! performs one observation through the [`JobRepository`]. Hosts either drive
//! it from their own timer or use the interval loops provided here. Dropping
//! the monitor ends the watch.

mod status;

pub use status::JobStatusView;

use std::sync::Arc;

use fundflow_client::{ClientError, LatestJob};
use fundflow_core::domain::id::{JobId, SpecificationId};
use fundflow_core::domain::job::{Job, JobOutcome, JobType};
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::config::WorkflowConfig;
use crate::error::MonitorError;
use crate::repository::JobRepository;

/// The tracked job reached a terminal state
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedJob {
    pub job: Job,
    pub outcome: JobOutcome,
}

/// What a single poll observed
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Nothing new
    Unchanged,
    /// The latest job snapshot changed
    Updated,
    /// The poll failed and will be retried on the next tick
    Retrying { attempt: u32 },
    /// The tracked job finished; reported once per tracked id
    TrackedJobFinished(FinishedJob),
}

#[derive(Debug)]
struct TrackedJob {
    id: JobId,
    snapshot: Option<Job>,
    settled: bool,
}

/// Live subscription to the jobs of one specification
pub struct JobMonitor {
    repository: Arc<dyn JobRepository>,
    target_id: SpecificationId,
    job_types: Vec<JobType>,
    poll_interval: Duration,
    max_poll_failures: u32,
    tracked: Option<TrackedJob>,
    consecutive_failures: u32,
    status: watch::Sender<JobStatusView>,
}

impl JobMonitor {
    /// Starts watching `target_id` for jobs of the given types
    ///
    /// No request is made until the first poll.
    pub fn watch(
        repository: Arc<dyn JobRepository>,
        target_id: SpecificationId,
        job_types: impl Into<Vec<JobType>>,
        config: &WorkflowConfig,
    ) -> Self {
        let job_types = job_types.into();
        debug!("Watching {:?} jobs for specification {}", job_types, target_id);

        let (status, _) = watch::channel(JobStatusView::checking());
        Self {
            repository,
            target_id,
            job_types,
            poll_interval: config.poll_interval,
            max_poll_failures: config.max_poll_failures,
            tracked: None,
            consecutive_failures: 0,
            status,
        }
    }

    pub fn target_id(&self) -> &SpecificationId {
        &self.target_id
    }

    pub fn job_types(&self) -> &[JobType] {
        &self.job_types
    }

    /// Current derived flags
    pub fn status(&self) -> JobStatusView {
        self.status.borrow().clone()
    }

    /// Receiver notified whenever the derived flags change
    pub fn subscribe(&self) -> watch::Receiver<JobStatusView> {
        self.status.subscribe()
    }

    /// Starts tracking a submitted job
    ///
    /// Tracking the id that is already tracked keeps its progress, so a
    /// finished job is never reported twice.
    pub fn track(&mut self, job_id: JobId) {
        if self.tracked.as_ref().is_some_and(|t| t.id == job_id) {
            return;
        }

        info!("Tracking job {} on specification {}", job_id, self.target_id);
        self.tracked = Some(TrackedJob {
            id: job_id,
            snapshot: None,
            settled: false,
        });
    }

    /// Stops tracking without affecting the latest-job watch
    pub fn untrack(&mut self) {
        if let Some(tracked) = self.tracked.take() {
            debug!("Stopped tracking job {}", tracked.id);
        }
    }

    pub fn tracked_job_id(&self) -> Option<&JobId> {
        self.tracked.as_ref().map(|t| &t.id)
    }

    /// The tracked job's outcome once it has been observed terminal
    pub fn finished_job(&self) -> Option<FinishedJob> {
        let tracked = self.tracked.as_ref().filter(|t| t.settled)?;
        let job = tracked.snapshot.clone()?;
        let outcome = job.outcome()?;
        Some(FinishedJob { job, outcome })
    }

    /// Performs one observation
    ///
    /// Transport errors are swallowed until more than `max_poll_failures`
    /// polls in a row have failed; from then on each failed poll returns
    /// `MonitorError::PollingFailed`. Any other error, such as a forbidden
    /// request or an unreadable job record, returns `MonitorError::Rejected`
    /// at once.
    pub async fn poll_once(&mut self) -> Result<MonitorEvent, MonitorError> {
        debug!("Polling latest job for specification {}", self.target_id);

        let latest = match self
            .repository
            .latest_job(&self.target_id, &self.job_types)
            .await
        {
            Ok(latest) => latest,
            Err(e) => return self.record_failure(e),
        };

        let changed = self.apply_latest(latest);

        let finished = match self.refresh_tracked().await {
            Ok(finished) => finished,
            Err(e) => return self.record_failure(e),
        };

        self.record_success();

        Ok(match finished {
            Some(finished) => MonitorEvent::TrackedJobFinished(finished),
            None if changed => MonitorEvent::Updated,
            None => MonitorEvent::Unchanged,
        })
    }

    /// Polls on the configured interval until the tracked job finishes
    pub async fn wait_for_tracked(&mut self) -> Result<FinishedJob, MonitorError> {
        if self.tracked.is_none() {
            return Err(MonitorError::NotTracking);
        }
        if let Some(finished) = self.finished_job() {
            return Ok(finished);
        }

        let mut interval = time::interval(self.poll_interval);
        loop {
            interval.tick().await;

            if let MonitorEvent::TrackedJobFinished(finished) = self.poll_once().await? {
                return Ok(finished);
            }
        }
    }

    /// Polls on the configured interval until no job is active
    pub async fn wait_until_idle(&mut self) -> Result<JobStatusView, MonitorError> {
        let mut interval = time::interval(self.poll_interval);
        loop {
            interval.tick().await;

            self.poll_once().await?;

            let view = self.status();
            if !view.is_checking_for_job && !view.has_active_job {
                return Ok(view);
            }
        }
    }

    fn apply_latest(&mut self, latest: LatestJob) -> bool {
        match latest {
            LatestJob::NotModified => self.status.send_if_modified(|view| {
                let was_checking = view.is_checking_for_job;
                view.is_checking_for_job = false;
                was_checking
            }),
            LatestJob::None => self.status.send_if_modified(|view| view.clear()),
            LatestJob::Found(job) => {
                if job.target_id != self.target_id {
                    warn!(
                        "Ignoring job {} for specification {} while watching {}",
                        job.id, job.target_id, self.target_id
                    );
                    return false;
                }
                self.status.send_if_modified(|view| view.apply_snapshot(job))
            }
        }
    }

    /// Observes the tracked job, directly if it is no longer the latest one
    async fn refresh_tracked(&mut self) -> Result<Option<FinishedJob>, ClientError> {
        let Some(tracked) = self.tracked.as_ref() else {
            return Ok(None);
        };
        if tracked.settled {
            return Ok(None);
        }

        let from_latest = self
            .status
            .borrow()
            .latest_job
            .as_ref()
            .filter(|job| job.id == tracked.id)
            .cloned();

        let snapshot = match from_latest {
            Some(job) => job,
            None => match self.repository.get_job(&tracked.id).await {
                Ok(job) => job,
                Err(e) if e.is_not_found() => {
                    debug!("Tracked job {} is not visible yet", tracked.id);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            },
        };

        Ok(self.apply_tracked(snapshot))
    }

    fn apply_tracked(&mut self, job: Job) -> Option<FinishedJob> {
        let tracked = self.tracked.as_mut()?;
        if job.id != tracked.id {
            return None;
        }

        if let Some(previous) = &tracked.snapshot {
            if job.status_timestamp < previous.status_timestamp {
                debug!("Ignoring stale snapshot of job {}", job.id);
                return None;
            }
        }

        tracked.snapshot = Some(job.clone());
        let outcome = job.outcome()?;
        tracked.settled = true;

        info!(
            "Job {} ({}) finished: {:?}",
            job.id,
            job.job_type.description(),
            outcome
        );
        Some(FinishedJob { job, outcome })
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.status.send_if_modified(|view| view.monitor_error.take().is_some());
    }

    fn record_failure(&mut self, err: ClientError) -> Result<MonitorEvent, MonitorError> {
        self.consecutive_failures += 1;
        let attempts = self.consecutive_failures;

        let failure = if !err.is_transient() {
            MonitorError::Rejected(err.to_string())
        } else if attempts > self.max_poll_failures {
            MonitorError::PollingFailed {
                attempts,
                last_error: err.to_string(),
            }
        } else {
            warn!(
                "Failed to poll jobs for specification {} (attempt {}/{}): {}",
                self.target_id, attempts, self.max_poll_failures, err
            );
            return Ok(MonitorEvent::Retrying { attempt: attempts });
        };

        error!(
            "Giving up on job status for specification {}: {}",
            self.target_id, failure
        );
        let reported = failure.clone();
        self.status.send_modify(|view| view.monitor_error = Some(reported));
        Err(failure)
    }
}

impl Drop for JobMonitor {
    fn drop(&mut self) {
        debug!("Stopped watching jobs for specification {}", self.target_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ClientErrorKind, FakeJobRepository, job_at, test_config};
    use fundflow_core::domain::job::{CompletionStatus, JobState};

    fn monitor(repo: &Arc<FakeJobRepository>) -> JobMonitor {
        JobMonitor::watch(
            repo.clone(),
            SpecificationId::new("S1"),
            JobType::FUNDING_ACTIONS,
            &test_config(),
        )
    }

    #[tokio::test]
    async fn test_checking_until_first_response() {
        let repo = Arc::new(FakeJobRepository::new());
        let mut monitor = monitor(&repo);
        assert!(monitor.status().is_checking_for_job);

        let event = monitor.poll_once().await.unwrap();

        assert_eq!(event, MonitorEvent::Updated);
        let view = monitor.status();
        assert!(!view.is_checking_for_job);
        assert!(view.latest_job.is_none());
        assert!(!view.has_active_job);
    }

    #[tokio::test]
    async fn test_tracked_job_reported_once() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::Queued, 1));
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::InProgress, 2));
        repo.push_latest(job_at(
            "J1",
            JobType::RefreshFunding,
            JobState::Completed(CompletionStatus::Succeeded),
            3,
        ));

        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        assert_eq!(monitor.poll_once().await.unwrap(), MonitorEvent::Updated);
        assert!(monitor.status().has_active_job);
        assert_eq!(monitor.poll_once().await.unwrap(), MonitorEvent::Updated);

        match monitor.poll_once().await.unwrap() {
            MonitorEvent::TrackedJobFinished(finished) => {
                assert_eq!(finished.outcome, JobOutcome::Succeeded);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // Same id and status again: nothing to report
        assert_eq!(monitor.poll_once().await.unwrap(), MonitorEvent::Unchanged);
        assert_eq!(monitor.poll_once().await.unwrap(), MonitorEvent::Unchanged);
        assert!(monitor.finished_job().is_some());
    }

    #[tokio::test]
    async fn test_foreign_job_never_finishes_tracked_job() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at(
            "J7",
            JobType::ApproveAllFunding,
            JobState::Completed(CompletionStatus::Succeeded),
            5,
        ));
        repo.push_job(job_at("J1", JobType::RefreshFunding, JobState::InProgress, 4));

        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        let event = monitor.poll_once().await.unwrap();

        assert_eq!(event, MonitorEvent::Updated);
        assert!(monitor.status().is_successful);
        assert!(monitor.finished_job().is_none());
        assert_eq!(repo.get_job_calls(), 1);
    }

    #[tokio::test]
    async fn test_tracked_job_finishes_behind_newer_job() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J7", JobType::ApproveAllFunding, JobState::Queued, 5));
        repo.push_job(job_at(
            "J1",
            JobType::RefreshFunding,
            JobState::Completed(CompletionStatus::Failed),
            4,
        ));

        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        match monitor.poll_once().await.unwrap() {
            MonitorEvent::TrackedJobFinished(finished) => {
                assert_eq!(finished.job.id, JobId::new("J1"));
                assert!(matches!(finished.outcome, JobOutcome::Failed { .. }));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tracked_job_not_yet_visible() {
        let repo = Arc::new(FakeJobRepository::new());
        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        // No latest job and get_job answers 404
        let event = monitor.poll_once().await.unwrap();

        assert_eq!(event, MonitorEvent::Updated);
        assert!(monitor.status().monitor_error.is_none());
    }

    #[tokio::test]
    async fn test_stale_tracked_snapshot_ignored() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::InProgress, 10));
        repo.push_latest(job_at(
            "J1",
            JobType::RefreshFunding,
            JobState::Completed(CompletionStatus::Failed),
            9,
        ));

        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        monitor.poll_once().await.unwrap();
        let event = monitor.poll_once().await.unwrap();

        assert_eq!(event, MonitorEvent::Unchanged);
        assert!(monitor.status().has_active_job);
        assert!(monitor.finished_job().is_none());
    }

    #[tokio::test]
    async fn test_not_modified_keeps_snapshot() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::InProgress, 1));
        repo.push_latest_response(LatestJob::NotModified);

        let mut monitor = monitor(&repo);
        monitor.poll_once().await.unwrap();
        let event = monitor.poll_once().await.unwrap();

        assert_eq!(event, MonitorEvent::Unchanged);
        assert!(monitor.status().has_active_job);
    }

    #[tokio::test]
    async fn test_transport_errors_escalate_after_bound() {
        let repo = Arc::new(FakeJobRepository::new());
        // test_config allows two failed polls in a row
        repo.push_latest_failure("connection reset");
        repo.push_latest_failure("connection reset");
        repo.push_latest_failure("connection reset");

        let mut monitor = monitor(&repo);

        assert_eq!(
            monitor.poll_once().await.unwrap(),
            MonitorEvent::Retrying { attempt: 1 }
        );
        assert_eq!(
            monitor.poll_once().await.unwrap(),
            MonitorEvent::Retrying { attempt: 2 }
        );

        let err = monitor.poll_once().await.unwrap_err();
        assert!(matches!(err, MonitorError::PollingFailed { attempts: 3, .. }));
        assert_eq!(monitor.status().monitor_error, Some(err));
    }

    #[tokio::test]
    async fn test_rejected_poll_escalates_at_once() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest_error(ClientErrorKind::Forbidden("no access to S1".into()));

        let mut monitor = monitor(&repo);
        let err = monitor.poll_once().await.unwrap_err();

        assert!(matches!(err, MonitorError::Rejected(_)));
        assert_eq!(monitor.status().monitor_error, Some(err));
        assert!(monitor.status().is_checking_for_job);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest_failure("timeout");
        repo.push_latest_failure("timeout");
        repo.push_latest_response(LatestJob::None);
        repo.push_latest_failure("timeout");

        let mut monitor = monitor(&repo);
        monitor.poll_once().await.unwrap();
        monitor.poll_once().await.unwrap();
        monitor.poll_once().await.unwrap();

        assert_eq!(
            monitor.poll_once().await.unwrap(),
            MonitorEvent::Retrying { attempt: 1 }
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::Queued, 1));

        let mut monitor = monitor(&repo);
        let mut receiver = monitor.subscribe();

        monitor.poll_once().await.unwrap();

        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().has_active_job);
    }

    #[tokio::test]
    async fn test_wait_for_tracked() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::RefreshFunding, JobState::InProgress, 1));
        repo.push_latest(job_at(
            "J1",
            JobType::RefreshFunding,
            JobState::Completed(CompletionStatus::TimedOut),
            2,
        ));

        let mut monitor = monitor(&repo);
        monitor.track(JobId::new("J1"));

        let finished = monitor.wait_for_tracked().await.unwrap();
        assert!(matches!(
            finished.outcome,
            JobOutcome::Failed {
                status: CompletionStatus::TimedOut,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_wait_until_idle() {
        let repo = Arc::new(FakeJobRepository::new());
        repo.push_latest(job_at("J1", JobType::ApproveAllFunding, JobState::Queued, 1));
        repo.push_latest_failure("connection reset");
        repo.push_latest(job_at("J1", JobType::ApproveAllFunding, JobState::InProgress, 2));
        repo.push_latest(job_at(
            "J1",
            JobType::ApproveAllFunding,
            JobState::Completed(CompletionStatus::Succeeded),
            3,
        ));

        let mut monitor = monitor(&repo);
        let view = monitor.wait_until_idle().await.unwrap();

        assert!(view.is_successful);
        assert_eq!(repo.latest_calls(), 4);
    }

    #[tokio::test]
    async fn test_wait_until_idle_without_jobs() {
        let repo = Arc::new(FakeJobRepository::new());
        let mut monitor = monitor(&repo);

        let view = monitor.wait_until_idle().await.unwrap();

        assert!(view.latest_job.is_none());
        assert_eq!(repo.latest_calls(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_tracked_requires_tracking() {
        let repo = Arc::new(FakeJobRepository::new());
        let mut monitor = monitor(&repo);
        assert_eq!(
            monitor.wait_for_tracked().await.unwrap_err(),
            MonitorError::NotTracking
        );
    }
}
