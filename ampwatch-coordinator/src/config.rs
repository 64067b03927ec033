//! Coordinator configuration
//!
//! Defines the cadence of the status poller, the pacing and backoff of the
//! step-execution loop, and the executor connection settings.

use std::time::Duration;

/// Coordinator configuration
///
/// All timeouts and intervals are configurable to allow tuning
/// for different deployments (local executor vs remote, fast vs slow networks).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Executor base URL (e.g., "http://localhost:8080")
    pub executor_url: String,

    /// How often the status poller asks the executor for a snapshot
    pub poll_interval: Duration,

    /// Pause between two successful step calls
    pub inter_step_delay: Duration,

    /// Backoff after the first consecutive step failure; doubles for each further one
    pub backoff_base: Duration,

    /// Consecutive step failures tolerated before the workload is declared failed
    pub max_consecutive_errors: u32,

    /// Upper bound on any single executor call
    pub call_timeout: Duration,
}

impl CoordinatorConfig {
    /// Creates a new configuration with defaults
    pub fn new(executor_url: String) -> Self {
        Self {
            executor_url,
            poll_interval: Duration::from_secs(2),
            inter_step_delay: Duration::from_millis(500),
            backoff_base: Duration::from_secs(1),
            max_consecutive_errors: 3,
            call_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AMPWATCH_EXECUTOR_URL (required)
    /// - AMPWATCH_POLL_INTERVAL_MS (optional, default: 2000)
    /// - AMPWATCH_STEP_DELAY_MS (optional, default: 500)
    /// - AMPWATCH_BACKOFF_BASE_MS (optional, default: 1000)
    /// - AMPWATCH_MAX_STEP_ERRORS (optional, default: 3)
    /// - AMPWATCH_CALL_TIMEOUT_SECS (optional, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let executor_url = std::env::var("AMPWATCH_EXECUTOR_URL")
            .map_err(|_| anyhow::anyhow!("AMPWATCH_EXECUTOR_URL environment variable not set"))?;

        let mut config = Self::new(executor_url);

        if let Some(ms) = env_parse::<u64>("AMPWATCH_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("AMPWATCH_STEP_DELAY_MS") {
            config.inter_step_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("AMPWATCH_BACKOFF_BASE_MS") {
            config.backoff_base = Duration::from_millis(ms);
        }
        if let Some(max) = env_parse::<u32>("AMPWATCH_MAX_STEP_ERRORS") {
            config.max_consecutive_errors = max;
        }
        if let Some(secs) = env_parse::<u64>("AMPWATCH_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_executor_url(mut self, url: impl Into<String>) -> Self {
        self.executor_url = url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_inter_step_delay(mut self, delay: Duration) -> Self {
        self.inter_step_delay = delay;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = max;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.executor_url.is_empty() {
            anyhow::bail!("executor_url cannot be empty");
        }

        if !self.executor_url.starts_with("http://") && !self.executor_url.starts_with("https://")
        {
            anyhow::bail!("executor_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.backoff_base.is_zero() {
            anyhow::bail!("backoff_base must be greater than 0");
        }

        if self.max_consecutive_errors == 0 {
            anyhow::bail!("max_consecutive_errors must be at least 1");
        }

        if self.call_timeout.is_zero() {
            anyhow::bail!("call_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
