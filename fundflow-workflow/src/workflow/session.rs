//! Action sessions
//!
//! One session is one orchestrated funding action: what the user asked for,
//! the job it produced and where the workflow currently stands.

use chrono::{DateTime, Utc};
use fundflow_core::domain::action::{ActionPayload, FundingAction};
use fundflow_core::domain::id::{JobId, ProviderId, SpecificationId};
use uuid::Uuid;

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    ActionRequested,
    Confirming,
    JobRunning,
    Complete,
    Error,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "Idle"),
            WorkflowState::ActionRequested => write!(f, "Action requested"),
            WorkflowState::Confirming => write!(f, "Confirming"),
            WorkflowState::JobRunning => write!(f, "Job running"),
            WorkflowState::Complete => write!(f, "Complete"),
            WorkflowState::Error => write!(f, "Error"),
        }
    }
}

/// Which providers an approve/release applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingScope {
    All,
    Providers(Vec<ProviderId>),
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionIntent {
    Refresh,
    Approve(FundingScope),
    Release(FundingScope),
}

impl ActionIntent {
    pub fn action(&self) -> FundingAction {
        match self {
            ActionIntent::Refresh => FundingAction::Refresh,
            ActionIntent::Approve(FundingScope::All) => FundingAction::ApproveAll,
            ActionIntent::Approve(FundingScope::Providers(_)) => FundingAction::ApproveBatch,
            ActionIntent::Release(FundingScope::All) => FundingAction::PublishAll,
            ActionIntent::Release(FundingScope::Providers(_)) => FundingAction::PublishBatch,
        }
    }

    pub fn payload(&self) -> ActionPayload {
        match self {
            ActionIntent::Approve(FundingScope::Providers(ids))
            | ActionIntent::Release(FundingScope::Providers(ids)) => {
                ActionPayload::Providers(ids.clone())
            }
            _ => ActionPayload::None,
        }
    }
}

/// Batch action fed by an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchActionKind {
    Approve,
    Release,
}

impl BatchActionKind {
    pub fn intent(&self, provider_ids: Vec<ProviderId>) -> ActionIntent {
        let scope = FundingScope::Providers(provider_ids);
        match self {
            BatchActionKind::Approve => ActionIntent::Approve(scope),
            BatchActionKind::Release => ActionIntent::Release(scope),
        }
    }
}

/// One orchestrated funding action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSession {
    pub id: Uuid,
    pub intent: ActionIntent,
    pub submitted_job_id: Option<JobId>,
    pub state: WorkflowState,
    pub started_at: DateTime<Utc>,
}

impl ActionSession {
    pub(crate) fn new(intent: ActionIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            intent,
            submitted_job_id: None,
            state: WorkflowState::ActionRequested,
            started_at: Utc::now(),
        }
    }
}

/// What the user is asked to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationSummary {
    pub action: FundingAction,
    pub target_id: SpecificationId,
    /// Empty for actions over all providers
    pub provider_ids: Vec<ProviderId>,
}

/// Terminal outcome of a session, emitted exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Redirect the user to the results view
    Completed {
        job_id: Option<JobId>,
        redirect: String,
    },
    /// Show the failure message
    Failed { message: String },
}
