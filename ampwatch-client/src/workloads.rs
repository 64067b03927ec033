//! Workload-related API endpoints

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::{ExecutorClient, StartWorkloadResponse, StatusResponse, StepResponse, WorkloadClient};

impl ExecutorClient {
    fn workloads_url(&self) -> String {
        format!("{}/api/diagnostics/workloads", self.base_url)
    }

    fn workload_url(&self, workload_id: &str, action: &str) -> String {
        format!("{}/{}/{}", self.workloads_url(), workload_id, action)
    }
}

#[async_trait]
impl WorkloadClient for ExecutorClient {
    // =============================================================================
    // Workload Lifecycle
    // =============================================================================

    async fn start_workload(&self) -> Result<StartWorkloadResponse> {
        let url = self.workloads_url();
        debug!(%url, "Starting diagnostic workload");
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    async fn execute_step(&self, workload_id: &str) -> Result<StepResponse> {
        let url = self.workload_url(workload_id, "step");
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Workload Status
    // =============================================================================

    async fn get_status(&self, workload_id: &str) -> Result<StatusResponse> {
        let url = self.workload_url(workload_id, "status");
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
