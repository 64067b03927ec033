//! Workload DTOs for executor communication

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::workload::{ResultEntry, StatusSnapshot, WorkloadStatus};

/// Response to a start-workload call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartWorkloadResponse {
    #[serde(alias = "workload_id", alias = "id")]
    pub workload_id: Option<String>,
    #[serde(alias = "first_step")]
    pub first_step: Option<String>,
    #[serde(alias = "total_steps")]
    pub total_steps: u32,
}

impl StartWorkloadResponse {
    /// Returns the workload id if the executor assigned a usable one
    pub fn assigned_id(&self) -> Option<&str> {
        self.workload_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Response to a single execute-step call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepResponse {
    #[serde(alias = "step_name", alias = "step")]
    pub step_name: String,
    #[serde(alias = "next_step")]
    pub next_step: Option<String>,
    pub complete: bool,
    pub warning: Option<String>,
    pub result: Option<JsonValue>,
    pub summary: Option<JsonValue>,
}

/// Raw status payload
///
/// Every field is optional; use [`StatusResponse::into_snapshot`] to get a
/// fully-defaulted [`StatusSnapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: Option<String>,
    #[serde(alias = "current_step")]
    pub current_step: Option<String>,
    #[serde(alias = "step_index")]
    pub step_index: Option<u32>,
    #[serde(alias = "total_steps")]
    pub total_steps: Option<u32>,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub results: Option<Vec<JsonValue>>,
    pub summary: Option<JsonValue>,
}

impl StatusResponse {
    /// Applies defaults: missing numbers become 0, missing arrays become
    /// empty, unknown status becomes Pending.
    pub fn into_snapshot(self) -> StatusSnapshot {
        let results = self
            .results
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, value)| result_entry_from_json(index, value))
            .collect();

        StatusSnapshot {
            status: self
                .status
                .as_deref()
                .map(WorkloadStatus::from_wire)
                .unwrap_or_default(),
            current_step: self.current_step.unwrap_or_default(),
            step_index: self.step_index.unwrap_or(0),
            total_steps: self.total_steps.unwrap_or(0),
            progress: self.progress.unwrap_or(0.0),
            message: self.message.unwrap_or_default(),
            results,
            summary: self.summary.filter(|s| !s.is_null()),
        }
    }
}

/// Builds a result entry from one element of the status `results` array
///
/// The step name is taken from `step`, `stepName` or `name`, falling back to
/// the element's position.
fn result_entry_from_json(index: usize, value: JsonValue) -> ResultEntry {
    let step = ["step", "stepName", "name"]
        .iter()
        .find_map(|key| value.get(*key).and_then(JsonValue::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("result-{}", index + 1));

    let warning = value
        .get("warning")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    ResultEntry {
        step,
        detail: Some(value),
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_response_camel_case() {
        let resp: StartWorkloadResponse = serde_json::from_value(json!({
            "workloadId": "w1",
            "firstStep": "initialize",
            "totalSteps": 5
        }))
        .unwrap();

        assert_eq!(resp.assigned_id(), Some("w1"));
        assert_eq!(resp.first_step.as_deref(), Some("initialize"));
        assert_eq!(resp.total_steps, 5);
    }

    #[test]
    fn test_start_response_blank_id_is_not_assigned() {
        let resp: StartWorkloadResponse =
            serde_json::from_value(json!({ "workloadId": "  " })).unwrap();
        assert_eq!(resp.assigned_id(), None);

        let resp: StartWorkloadResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.assigned_id(), None);
    }

    #[test]
    fn test_step_response_defaults() {
        let resp: StepResponse =
            serde_json::from_value(json!({ "stepName": "cell_balance" })).unwrap();

        assert_eq!(resp.step_name, "cell_balance");
        assert!(!resp.complete);
        assert!(resp.next_step.is_none());
        assert!(resp.warning.is_none());
    }

    #[test]
    fn test_empty_status_snapshot_uses_defaults() {
        let resp: StatusResponse = serde_json::from_value(json!({})).unwrap();
        let snapshot = resp.into_snapshot();

        assert_eq!(snapshot.status, WorkloadStatus::Pending);
        assert_eq!(snapshot.step_index, 0);
        assert_eq!(snapshot.total_steps, 0);
        assert_eq!(snapshot.progress, 0.0);
        assert!(snapshot.results.is_empty());
        assert!(snapshot.summary.is_none());
    }

    #[test]
    fn test_status_snapshot_with_nulls_and_unknown_status() {
        let resp: StatusResponse = serde_json::from_value(json!({
            "status": "warming_up",
            "stepIndex": null,
            "results": null,
            "summary": null
        }))
        .unwrap();
        let snapshot = resp.into_snapshot();

        assert_eq!(snapshot.status, WorkloadStatus::Pending);
        assert_eq!(snapshot.step_index, 0);
        assert!(snapshot.results.is_empty());
        assert!(snapshot.summary.is_none());
    }

    #[test]
    fn test_status_snapshot_results_named() {
        let resp: StatusResponse = serde_json::from_value(json!({
            "status": "running",
            "currentStep": "impedance",
            "stepIndex": 2,
            "totalSteps": 5,
            "progress": 40.0,
            "message": "Measuring impedance",
            "results": [
                { "step": "initialize", "ok": true },
                { "ok": false, "warning": "sensor offline" }
            ]
        }))
        .unwrap();
        let snapshot = resp.into_snapshot();

        assert_eq!(snapshot.status, WorkloadStatus::Running);
        assert_eq!(snapshot.current_step, "impedance");
        assert_eq!(snapshot.results[0].step, "initialize");
        assert_eq!(snapshot.results[1].step, "result-2");
        assert_eq!(snapshot.results[1].warning.as_deref(), Some("sensor offline"));
    }
}
