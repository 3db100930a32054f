//! Permissions repository

use async_trait::async_trait;
use fundflow_client::{FundingClient, Result};
use fundflow_core::domain::id::SpecificationId;
use fundflow_core::domain::permission::Permission;
use std::sync::Arc;

/// Read-only permission lookup consulted before a funding action starts
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Checks whether the current user holds `permission` on the specification
    async fn has_permission(
        &self,
        specification_id: &SpecificationId,
        permission: Permission,
    ) -> Result<bool>;
}

/// HTTP implementation of PermissionRepository
pub struct HttpPermissionRepository {
    client: Arc<FundingClient>,
}

impl HttpPermissionRepository {
    /// Creates a new HTTP permission repository
    pub fn new(client: Arc<FundingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PermissionRepository for HttpPermissionRepository {
    async fn has_permission(
        &self,
        specification_id: &SpecificationId,
        permission: Permission,
    ) -> Result<bool> {
        let permissions = self
            .client
            .specification_permissions(specification_id)
            .await?;
        Ok(permissions.contains(&permission))
    }
}
