//! Batch upload API endpoints

use fundflow_core::domain::id::{BatchId, ProviderId};
use fundflow_core::dto::batch::BatchUploadResponse;
use reqwest::multipart::{Form, Part};

use crate::FundingClient;
use crate::error::Result;

impl FundingClient {
    // =============================================================================
    // Batch Uploads
    // =============================================================================

    /// Upload a batch file of provider ids
    ///
    /// # Arguments
    /// * `file_name` - Original file name, forwarded to the backend
    /// * `contents` - Raw file bytes
    ///
    /// # Returns
    /// The id the backend assigned to the batch
    pub async fn upload_batch(&self, file_name: &str, contents: Vec<u8>) -> Result<BatchId> {
        let url = format!("{}/api/batches", self.base_url);
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let uploaded: BatchUploadResponse = self.handle_response(response).await?;

        Ok(uploaded.batch_id)
    }

    /// Get the provider ids extracted from a validated batch
    pub async fn batch_provider_ids(&self, batch_id: &BatchId) -> Result<Vec<ProviderId>> {
        let url = format!("{}/api/batches/{}/providers", self.base_url, batch_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
