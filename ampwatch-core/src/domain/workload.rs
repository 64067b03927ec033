//! Workload domain types

use serde::{Deserialize, Serialize};

/// Identifies one diagnostic workload on the executor
///
/// Assigned once by `start()` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadHandle {
    pub id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl WorkloadHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Workload lifecycle status
///
/// Transitions only move forward: Pending -> Running -> (Completed | Failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkloadStatus {
    /// Parses an executor status string
    ///
    /// Unknown or empty values map to `Pending` so a malformed snapshot can
    /// never push the merged state into a terminal status.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" | "in_progress" | "in-progress" => Self::Running,
            "completed" | "complete" | "success" | "succeeded" => Self::Completed,
            "failed" | "error" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Completed and Failed are terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Returns true if moving from `self` to `next` respects the forward-only order
    pub fn can_advance_to(self, next: WorkloadStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Result reported for a single diagnostic step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub step: String,
    pub detail: Option<serde_json::Value>,
    pub warning: Option<String>,
}

/// Point-in-time status report from the executor
///
/// Built from the raw status payload with every default already applied,
/// so merge logic never re-checks field presence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    pub status: WorkloadStatus,
    pub current_step: String,
    pub step_index: u32,
    pub total_steps: u32,
    pub progress: f64,
    pub message: String,
    pub results: Vec<ResultEntry>,
    pub summary: Option<serde_json::Value>,
}

/// The coordinator's merged view of one workload
///
/// Written only by the coordinator's update processor; everyone else reads
/// cloned snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkloadState {
    pub status: WorkloadStatus,
    pub current_step: Option<String>,
    pub step_index: u32,
    pub total_steps: u32,
    pub progress_percent: u8,
    pub message: String,
    pub result_entries: Vec<ResultEntry>,
    pub summary: Option<serde_json::Value>,
    pub last_error: Option<String>,
}

impl WorkloadState {
    /// Fresh state for a workload that has not been created yet
    pub fn pending() -> Self {
        Self {
            message: "Waiting to start".to_string(),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Appends a result entry unless one for the same step is already recorded
    ///
    /// Returns true if the entry was appended.
    pub fn push_result(&mut self, entry: ResultEntry) -> bool {
        if self.result_entries.iter().any(|e| e.step == entry.step) {
            return false;
        }
        self.result_entries.push(entry);
        true
    }
}

/// Converts a raw percentage into the clamped 0-100 range
pub fn clamp_percent(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}
