//! Ampwatch Executor Client
//!
//! A small, type-safe HTTP client for the remote diagnostic executor.
//!
//! The executor runs one multi-step diagnostic workload per `start` call and
//! advances it one bounded-time step per `step` call. This crate exposes that
//! call contract as the [`WorkloadClient`] trait, so the coordinator can be
//! driven by the HTTP implementation ([`ExecutorClient`]) in production and by
//! an in-memory script in tests.
//!
//! # Example
//!
//! ```no_run
//! use ampwatch_client::{ExecutorClient, WorkloadClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ExecutorClient::new("http://localhost:8080");
//!
//!     let started = client.start_workload().await?;
//!     println!("Started workload: {:?}", started.workload_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod workloads;

// Re-export commonly used types
pub use ampwatch_core::dto::workload::{StartWorkloadResponse, StatusResponse, StepResponse};
pub use error::{ClientError, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Call contract of the remote diagnostic executor
///
/// Implementations are pure I/O: no retries, no timeouts, no interpretation
/// of the payloads beyond deserialization.
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// Creates a new workload
    async fn start_workload(&self) -> Result<StartWorkloadResponse>;

    /// Advances the workload by at most one step
    ///
    /// # Arguments
    /// * `workload_id` - The id returned by `start_workload`
    async fn execute_step(&self, workload_id: &str) -> Result<StepResponse>;

    /// Fetches the executor's current view of the workload
    ///
    /// # Arguments
    /// * `workload_id` - The id returned by `start_workload`
    async fn get_status(&self, workload_id: &str) -> Result<StatusResponse>;
}

/// HTTP client for the diagnostic executor API
#[derive(Debug, Clone)]
pub struct ExecutorClient {
    /// Base URL of the executor (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ExecutorClient {
    /// Create a client for the executor at `base_url`
    ///
    /// A trailing slash is ignored. Calls carry no timeout of their own; the
    /// coordinator bounds every call.
    ///
    /// # Example
    /// ```
    /// use ampwatch_client::ExecutorClient;
    ///
    /// let client = ExecutorClient::new("http://localhost:8080/");
    /// assert_eq!(client.base_url(), "http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Base URL of the executor, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn an executor response into `T`, or into an `ApiError` for non-2xx
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("Unknown error");
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message(&body, reason),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Human-readable message from an executor error body
///
/// The executor answers failures with `{"error": ".."}` or `{"message": ".."}`;
/// anything else is passed through as text, and an empty body falls back to
/// the HTTP reason phrase.
fn error_message(body: &str, reason: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return reason.to_string();
    }

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["error", "message"]
                .iter()
                .find_map(|key| json.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
