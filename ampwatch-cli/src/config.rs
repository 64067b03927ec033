//! Configuration module
//!
//! Global CLI settings shared by every command.

use std::time::Duration;

use ampwatch_coordinator::CoordinatorConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the diagnostic executor
    pub executor_url: String,

    /// Upper bound on a single executor call, in seconds
    pub call_timeout_secs: u64,
}

impl Config {
    /// Coordinator settings derived from the global flags
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new(self.executor_url.clone())
            .with_call_timeout(Duration::from_secs(self.call_timeout_secs))
    }
}
