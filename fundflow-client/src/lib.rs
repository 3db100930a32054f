//! Fundflow HTTP Client
//!
//! A typed HTTP client for the funding backend: job status, job-creating
//! funding actions, batch uploads and permission lookups.
//!
//! The client performs exactly one request per call and never retries;
//! retry and polling policy belong to the workflow layer.
//!
//! # Example
//!
//! ```no_run
//! use fundflow_client::{FundingClient, LatestJob};
//! use fundflow_core::domain::id::SpecificationId;
//! use fundflow_core::domain::job::JobType;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FundingClient::new("http://localhost:8080");
//!     let spec = SpecificationId::new("S1");
//!
//!     if let LatestJob::Found(job) = client.latest_job(&spec, &[JobType::RefreshFunding]).await? {
//!         println!("{}", job.progress_message());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod batches;
mod jobs;
mod permissions;

// Re-export commonly used types
pub use error::{ClientError, FieldError, Result};
pub use jobs::{JobCreation, LatestJob};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the funding backend API
///
/// Methods are organized into logical groups:
/// - Job status (latest job per specification, single job)
/// - Funding actions (refresh, approve, release, batch validation)
/// - Batch uploads
/// - Permission lookups
#[derive(Debug, Clone)]
pub struct FundingClient {
    /// Base URL of the backend (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl FundingClient {
    /// Create a new funding client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new funding client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use fundflow_client::FundingClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = FundingClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn a non-success response into a classified error
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::classify(status, body)
    }

    /// Handle an API response and deserialize JSON
    ///
    /// 304 responses are reported as `ClientError::NotModified`; callers that
    /// treat "no change" as success match on it.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            return Err(Self::error_for(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
