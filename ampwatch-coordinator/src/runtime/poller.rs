//! Status poller
//!
//! Asks the executor for a status snapshot on a fixed cadence and forwards it
//! to the coordinator. Poll failures are logged and reported but never stop
//! the loop; only a terminal snapshot or cancellation does.

use std::sync::Arc;
use std::time::Duration;

use ampwatch_client::WorkloadClient;
use ampwatch_core::domain::workload::WorkloadHandle;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::call_with_timeout;
use crate::config::CoordinatorConfig;
use crate::error::WorkloadError;
use crate::events::WorkloadEvent;

/// Periodically polls the executor for the workload's status
pub struct StatusPoller {
    client: Arc<dyn WorkloadClient>,
    handle: WorkloadHandle,
    events: mpsc::Sender<WorkloadEvent>,
    cancel: CancellationToken,
    poll_interval: Duration,
    call_timeout: Duration,
}

impl StatusPoller {
    pub fn new(
        client: Arc<dyn WorkloadClient>,
        handle: WorkloadHandle,
        config: &CoordinatorConfig,
        events: mpsc::Sender<WorkloadEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            handle,
            events,
            cancel,
            poll_interval: config.poll_interval,
            call_timeout: config.call_timeout,
        }
    }

    /// Starts the polling loop
    pub async fn run(self) {
        info!(
            workload_id = %self.handle.id,
            "Starting status poller (interval: {:?})",
            self.poll_interval
        );

        // The workload was created a moment ago; the first snapshot is due one interval from now.
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Status poller cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Status poller cancelled while awaiting status");
                    return;
                }
                result = call_with_timeout(
                    self.call_timeout,
                    self.client.get_status(&self.handle.id),
                ) => result,
            };

            match outcome {
                Ok(response) => {
                    let snapshot = response.into_snapshot();
                    let status = snapshot.status;
                    debug!(
                        %status,
                        step_index = snapshot.step_index,
                        progress = snapshot.progress,
                        "Received status snapshot"
                    );

                    if !self.report(WorkloadEvent::Snapshot(snapshot)).await {
                        return;
                    }
                    if status.is_terminal() {
                        info!(%status, "Workload reached a terminal status, stopping poller");
                        return;
                    }
                }
                Err(e) => {
                    warn!(
                        timeout = e.is_timeout(),
                        server_error = e.is_server_error(),
                        error = %e,
                        "Status poll failed"
                    );
                    let event = WorkloadEvent::Failure(WorkloadError::Poll(e.to_string()));
                    if !self.report(event).await {
                        return;
                    }
                }
            }
        }
    }

    /// Sends an event to the coordinator; false once the coordinator is gone
    async fn report(&self, event: WorkloadEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("Update channel closed, stopping status poller");
            return false;
        }
        true
    }
}
