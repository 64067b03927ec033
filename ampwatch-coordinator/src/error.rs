//! Error types for the workload coordinator

use thiserror::Error;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, WorkloadError>;

/// Errors raised while driving a diagnostic workload
///
/// Only `Start` and `AlreadyRunning` are returned to the caller. The rest
/// travel through the update channel and end up in `WorkloadState::last_error`.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The executor did not create the workload
    #[error("Failed to start workload: {0}")]
    Start(String),

    /// `start()` was called while a workload is still active
    #[error("A diagnostic workload is already running")]
    AlreadyRunning,

    /// A single step call failed; it will be retried
    #[error("Step attempt {attempt} failed: {message}")]
    Step { attempt: u32, message: String },

    /// Consecutive step failures reached the ceiling
    #[error("Giving up after {attempts} consecutive step failures: {message}")]
    StepsExhausted { attempts: u32, message: String },

    /// A status poll failed
    #[error("Status poll failed: {0}")]
    Poll(String),
}

impl WorkloadError {
    /// Fatal errors move the workload to Failed
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StepsExhausted { .. })
    }
}
