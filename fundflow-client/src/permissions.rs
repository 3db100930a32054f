//! Permission lookup endpoint

use fundflow_core::domain::id::SpecificationId;
use fundflow_core::domain::permission::Permission;
use fundflow_core::dto::permission::PermissionsResponse;

use crate::FundingClient;
use crate::error::Result;

impl FundingClient {
    /// Get the current user's effective permissions on a specification
    pub async fn specification_permissions(
        &self,
        specification_id: &SpecificationId,
    ) -> Result<Vec<Permission>> {
        let url = format!(
            "{}/api/specs/{}/permissions",
            self.base_url, specification_id
        );
        let response = self.client.get(&url).send().await?;

        let body: PermissionsResponse = self.handle_response(response).await?;
        Ok(body.permissions)
    }
}
