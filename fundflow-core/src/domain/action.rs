//! Funding actions
//!
//! The fixed set of user-confirmed operations that create a backend job.

use serde::{Deserialize, Serialize};

use super::id::{BatchId, ProviderId};
use super::job::JobType;
use super::permission::Permission;

/// A job-creating request the client is allowed to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundingAction {
    Refresh,
    ApproveAll,
    ApproveBatch,
    PublishAll,
    PublishBatch,
    BatchValidate,
}

impl FundingAction {
    /// The job type the backend creates for this action
    pub fn job_type(&self) -> JobType {
        match self {
            FundingAction::Refresh => JobType::RefreshFunding,
            FundingAction::ApproveAll => JobType::ApproveAllFunding,
            FundingAction::ApproveBatch => JobType::ApproveBatchFunding,
            FundingAction::PublishAll => JobType::PublishAllFunding,
            FundingAction::PublishBatch => JobType::PublishBatchFunding,
            FundingAction::BatchValidate => JobType::ValidateBatch,
        }
    }

    /// Permission the user needs on the specification
    pub fn required_permission(&self) -> Permission {
        match self {
            FundingAction::Refresh => Permission::CanRefreshFunding,
            FundingAction::ApproveAll | FundingAction::ApproveBatch => {
                Permission::CanApproveFunding
            }
            FundingAction::PublishAll | FundingAction::PublishBatch => {
                Permission::CanReleaseFunding
            }
            FundingAction::BatchValidate => Permission::CanUploadBatch,
        }
    }

    /// Whether the action is scoped to an explicit provider subset
    pub fn is_batch(&self) -> bool {
        matches!(self, FundingAction::ApproveBatch | FundingAction::PublishBatch)
    }

    /// Label shown on confirmation screens
    pub fn label(&self) -> &'static str {
        match self {
            FundingAction::Refresh => "Refresh funding",
            FundingAction::ApproveAll => "Approve all funding",
            FundingAction::ApproveBatch => "Approve selected funding",
            FundingAction::PublishAll => "Release all funding",
            FundingAction::PublishBatch => "Release selected funding",
            FundingAction::BatchValidate => "Validate uploaded batch",
        }
    }
}

impl std::fmt::Display for FundingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Optional data sent along with an action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionPayload {
    #[default]
    None,
    /// Provider subset for batch approve/release
    Providers(Vec<ProviderId>),
    /// Uploaded batch to validate
    Batch(BatchId),
}

impl ActionPayload {
    pub fn provider_ids(&self) -> &[ProviderId] {
        match self {
            ActionPayload::Providers(ids) => ids,
            _ => &[],
        }
    }
}
