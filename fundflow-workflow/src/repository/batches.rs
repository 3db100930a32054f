//! Batch repository
//!
//! Handles batch file uploads and retrieval of the provider ids a
//! validated batch resolved to.

use anyhow::Context;
use async_trait::async_trait;
use fundflow_client::{FundingClient, Result};
use fundflow_core::domain::id::{BatchId, ProviderId};
use std::path::Path;
use std::sync::Arc;

/// A batch file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }

    /// Reads a batch file from disk, keeping only its file name
    pub async fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "batch".to_string());

        Ok(Self { name, contents })
    }
}

/// Repository trait for batch upload operations
#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// Uploads a batch file and returns the id the backend assigned
    async fn upload_file(&self, file: &BatchFile) -> Result<BatchId>;

    /// Fetches the provider ids resolved from a validated batch
    async fn ids_for_batch(&self, batch_id: &BatchId) -> Result<Vec<ProviderId>>;
}

/// HTTP implementation of BatchRepository
pub struct HttpBatchRepository {
    client: Arc<FundingClient>,
}

impl HttpBatchRepository {
    /// Creates a new HTTP batch repository
    pub fn new(client: Arc<FundingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BatchRepository for HttpBatchRepository {
    async fn upload_file(&self, file: &BatchFile) -> Result<BatchId> {
        self.client
            .upload_batch(&file.name, file.contents.clone())
            .await
    }

    async fn ids_for_batch(&self, batch_id: &BatchId) -> Result<Vec<ProviderId>> {
        self.client.batch_provider_ids(batch_id).await
    }
}
