//! Configuration module
//!
//! Builds the workflow configuration from command-line arguments layered
//! over the `FUNDFLOW_*` environment variables.

use std::time::Duration;

use anyhow::Result;
use fundflow_workflow::WorkflowConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings shared with the workflow library
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Resolves the configuration
    ///
    /// # Arguments
    /// * `api_url` - Backend URL from `--api-url` or FUNDFLOW_API_URL
    /// * `poll_interval_ms` - Override for the poll interval, if given
    pub fn load(api_url: String, poll_interval_ms: Option<u64>) -> Result<Self> {
        let mut workflow = WorkflowConfig::new(api_url).with_env_overrides();

        if let Some(ms) = poll_interval_ms {
            workflow = workflow.with_poll_interval(Duration::from_millis(ms));
        }

        workflow.validate()?;
        Ok(Self { workflow })
    }
}
