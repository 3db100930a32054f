//! Batch upload DTOs

use serde::{Deserialize, Serialize};

use crate::domain::id::BatchId;

/// Response to a batch file upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUploadResponse {
    pub batch_id: BatchId,
}
