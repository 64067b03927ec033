//! Observations reported by the workload loops
//!
//! The step loop and the status poller never touch the merged state. They
//! send these messages to the coordinator's update processor instead.

use ampwatch_client::StepResponse;
use ampwatch_core::domain::workload::{ResultEntry, StatusSnapshot};
use serde_json::Value as JsonValue;

use crate::error::WorkloadError;

const MISSING_NEXT_STEP_WARNING: &str = "executor response had no next step; treated as complete";

/// A single message from one of the loops
#[derive(Debug)]
pub enum WorkloadEvent {
    /// The step loop finished one step
    StepCompleted(StepReport),
    /// The poller received a status snapshot
    Snapshot(StatusSnapshot),
    /// Either loop hit an error; fatal ones end the workload
    Failure(WorkloadError),
}

/// Outcome of one successful step call
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// 1-based count of successful steps in this workload
    pub ordinal: u32,
    pub step_name: String,
    pub next_step: Option<String>,
    pub complete: bool,
    /// The executor sent no next step without saying the workload was complete
    pub implicit_completion: bool,
    pub warning: Option<String>,
    pub result: Option<JsonValue>,
    pub summary: Option<JsonValue>,
}

impl StepReport {
    pub fn from_response(ordinal: u32, response: StepResponse) -> Self {
        let next_step = response
            .next_step
            .filter(|step| !step.trim().is_empty());
        let implicit_completion = !response.complete && next_step.is_none();

        let warning = match response.warning {
            Some(warning) => Some(warning),
            None if implicit_completion => Some(MISSING_NEXT_STEP_WARNING.to_string()),
            None => None,
        };

        let step_name = if response.step_name.trim().is_empty() {
            format!("step-{}", ordinal)
        } else {
            response.step_name
        };

        Self {
            ordinal,
            step_name,
            next_step,
            complete: response.complete,
            implicit_completion,
            warning,
            result: response.result,
            summary: response.summary.filter(|s| !s.is_null()),
        }
    }

    /// True when no further step should be requested
    pub fn is_final(&self) -> bool {
        self.complete || self.next_step.is_none()
    }

    pub fn result_entry(&self) -> ResultEntry {
        ResultEntry {
            step: self.step_name.clone(),
            detail: self.result.clone(),
            warning: self.warning.clone(),
        }
    }
}
