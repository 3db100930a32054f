//! Specification permissions consulted before starting a funding action

use serde::{Deserialize, Serialize};

/// Permission a user may hold on a specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    CanRefreshFunding,
    CanApproveFunding,
    CanReleaseFunding,
    CanUploadBatch,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::CanRefreshFunding => write!(f, "CanRefreshFunding"),
            Permission::CanApproveFunding => write!(f, "CanApproveFunding"),
            Permission::CanReleaseFunding => write!(f, "CanReleaseFunding"),
            Permission::CanUploadBatch => write!(f, "CanUploadBatch"),
        }
    }
}
