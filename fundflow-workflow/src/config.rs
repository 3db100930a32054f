//! Workflow configuration
//!
//! Defines the polling and redirect parameters shared by job monitors,
//! batch upload pipelines and workflows.

use std::time::Duration;

use fundflow_core::domain::id::SpecificationId;

/// Workflow configuration
///
/// Intervals and retry bounds are configurable to allow tuning for
/// different deployment scenarios (dev vs prod, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Funding backend base URL (e.g., "http://localhost:8080")
    pub api_url: String,

    /// How often job monitors poll for the latest job
    pub poll_interval: Duration,

    /// Consecutive failed polls tolerated before the monitor reports an error
    pub max_poll_failures: u32,

    /// Results view template; `{id}` is replaced by the specification id
    pub results_path: String,
}

impl WorkflowConfig {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            poll_interval: Duration::from_millis(2000),
            max_poll_failures: 5,
            results_path: "/specifications/{id}/funding".to_string(),
        }
    }

    /// Applies the optional environment variables on top of this configuration
    ///
    /// - FUNDFLOW_POLL_INTERVAL_MS (default: 2000)
    /// - FUNDFLOW_MAX_POLL_FAILURES (default: 5)
    /// - FUNDFLOW_RESULTS_PATH (default: /specifications/{id}/funding)
    ///
    /// Unset or unparsable variables leave the current value in place.
    pub fn with_env_overrides(self) -> Self {
        let mut config = self;

        if let Some(interval) = std::env::var("FUNDFLOW_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.poll_interval = Duration::from_millis(interval);
        }

        if let Some(max) = std::env::var("FUNDFLOW_MAX_POLL_FAILURES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.max_poll_failures = max;
        }

        if let Ok(path) = std::env::var("FUNDFLOW_RESULTS_PATH") {
            config.results_path = path;
        }

        config
    }

    /// Sets the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the failed poll bound
    pub fn with_max_poll_failures(mut self, max: u32) -> Self {
        self.max_poll_failures = max;
        self
    }

    /// Where to send the user once a job for this specification succeeds
    pub fn results_path_for(&self, specification_id: &SpecificationId) -> String {
        self.results_path.replace("{id}", specification_id.as_str())
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if !self.results_path.contains("{id}") {
            anyhow::bail!("results_path must contain an {{id}} placeholder");
        }

        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}
