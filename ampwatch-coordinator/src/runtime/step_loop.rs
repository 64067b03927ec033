//! Step-execution loop
//!
//! The executor advances a workload by at most one step per call, so this
//! loop keeps calling `execute_step` until the workload reports completion or
//! too many calls in a row have failed.

use std::sync::Arc;
use std::time::Duration;

use ampwatch_client::WorkloadClient;
use ampwatch_core::domain::workload::WorkloadHandle;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::call_with_timeout;
use crate::config::CoordinatorConfig;
use crate::error::WorkloadError;
use crate::events::{StepReport, WorkloadEvent};

/// Delay before retrying after the `consecutive_errors`-th failure in a row
///
/// `base * 2^(consecutive_errors - 1)`, saturating instead of overflowing.
pub fn backoff_delay(base: Duration, consecutive_errors: u32) -> Duration {
    let exponent = consecutive_errors.saturating_sub(1);
    base.saturating_mul(2u32.saturating_pow(exponent))
}

/// Drives one workload to completion, one step call at a time
pub struct StepLoop {
    client: Arc<dyn WorkloadClient>,
    handle: WorkloadHandle,
    events: mpsc::Sender<WorkloadEvent>,
    cancel: CancellationToken,
    inter_step_delay: Duration,
    backoff_base: Duration,
    max_consecutive_errors: u32,
    call_timeout: Duration,
}

impl StepLoop {
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
            inter_step_delay: config.inter_step_delay,
            backoff_base: config.backoff_base,
            max_consecutive_errors: config.max_consecutive_errors.max(1),
            call_timeout: config.call_timeout,
        }
    }

    /// Runs until the workload is complete, the error ceiling is hit, or the
    /// cancellation token fires
    pub async fn run(self) {
        info!(workload_id = %self.handle.id, "Starting step loop");

        let mut completed_steps: u32 = 0;
        let mut consecutive_errors: u32 = 0;

        while consecutive_errors < self.max_consecutive_errors {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Step loop cancelled while awaiting step");
                    return;
                }
                result = call_with_timeout(
                    self.call_timeout,
                    self.client.execute_step(&self.handle.id),
                ) => result,
            };

            match outcome {
                Ok(response) => {
                    consecutive_errors = 0;
                    completed_steps += 1;

                    let report = StepReport::from_response(completed_steps, response);
                    let finished = report.is_final();

                    if report.implicit_completion {
                        warn!(
                            step = %report.step_name,
                            ordinal = completed_steps,
                            "Executor sent no next step; treating workload as complete"
                        );
                    } else {
                        debug!(
                            step = %report.step_name,
                            ordinal = completed_steps,
                            next = ?report.next_step,
                            "Step completed"
                        );
                    }

                    if !self.report(WorkloadEvent::StepCompleted(report)).await {
                        return;
                    }

                    if finished {
                        info!(steps = completed_steps, "Step loop finished");
                        return;
                    }

                    if !self.pause(self.inter_step_delay).await {
                        return;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;

                    if consecutive_errors >= self.max_consecutive_errors {
                        error!(
                            attempts = consecutive_errors,
                            timeout = e.is_timeout(),
                            rejected = e.is_client_error(),
                            error = %e,
                            "Step failures reached the ceiling, giving up"
                        );
                        self.report(WorkloadEvent::Failure(WorkloadError::StepsExhausted {
                            attempts: consecutive_errors,
                            message: e.to_string(),
                        }))
                        .await;
                        return;
                    }

                    let delay = backoff_delay(self.backoff_base, consecutive_errors);
                    warn!(
                        attempt = consecutive_errors,
                        delay_ms = delay.as_millis() as u64,
                        timeout = e.is_timeout(),
                        rejected = e.is_client_error(),
                        error = %e,
                        "Step failed, retrying after backoff"
                    );

                    let reported = self
                        .report(WorkloadEvent::Failure(WorkloadError::Step {
                            attempt: consecutive_errors,
                            message: e.to_string(),
                        }))
                        .await;
                    if !reported || !self.pause(delay).await {
                        return;
                    }
                }
            }
        }
    }

    /// Sends an event to the coordinator; false once the coordinator is gone
    async fn report(&self, event: WorkloadEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("Update channel closed, stopping step loop");
            return false;
        }
        true
    }

    /// Sleeps unless cancelled first; false on cancellation
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Step loop cancelled while sleeping");
                false
            }
            _ = time::sleep(delay) => true,
        }
    }
}
