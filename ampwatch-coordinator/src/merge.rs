//! Folding loop observations into the merged workload state
//!
//! Fields are last-writer-wins, with three exceptions: `step_index` and
//! `progress_percent` never move backwards, `status` only moves forward, and
//! once the state is terminal nothing changes again (so `summary` is written
//! exactly once).

use ampwatch_core::domain::workload::{
    StatusSnapshot, WorkloadState, WorkloadStatus, clamp_percent,
};
use tracing::debug;

use crate::error::WorkloadError;
use crate::events::{StepReport, WorkloadEvent};

/// Applies one event to the state
///
/// Returns true if any field changed.
pub fn apply(state: &mut WorkloadState, event: WorkloadEvent) -> bool {
    if state.is_terminal() {
        debug!(status = %state.status, "Ignoring event for terminal workload");
        return false;
    }

    let before = state.clone();

    match event {
        WorkloadEvent::StepCompleted(report) => apply_step(state, report),
        WorkloadEvent::Snapshot(snapshot) => apply_snapshot(state, snapshot),
        WorkloadEvent::Failure(error) => apply_failure(state, error),
    }

    *state != before
}

fn apply_step(state: &mut WorkloadState, report: StepReport) {
    let announced_total = state.total_steps;

    state.step_index = state.step_index.max(report.ordinal);
    state.total_steps = state.total_steps.max(state.step_index);
    if announced_total > 0 {
        raise_progress(state, step_percent(state.step_index, announced_total));
    }

    state.push_result(report.result_entry());

    if report.is_final() {
        finish(state, WorkloadStatus::Completed, report.summary);
        state.current_step = Some(report.step_name);
        state.message = "Diagnostics complete".to_string();
        return;
    }

    state.message = format!("Completed step {}", report.step_name);
    state.current_step = report.next_step;
}

fn apply_snapshot(state: &mut WorkloadState, snapshot: StatusSnapshot) {
    // A terminal snapshot still ends the workload, it just cannot move the index back.
    let stale = snapshot.step_index < state.step_index;
    if stale && !snapshot.status.is_terminal() {
        debug!(
            snapshot_index = snapshot.step_index,
            recorded_index = state.step_index,
            "Discarding stale status snapshot"
        );
        return;
    }

    if !stale {
        state.step_index = snapshot.step_index;
        if snapshot.total_steps > 0 {
            state.total_steps = snapshot.total_steps;
        }
        state.total_steps = state.total_steps.max(state.step_index);
        raise_progress(state, clamp_percent(snapshot.progress));

        if !snapshot.current_step.is_empty() {
            state.current_step = Some(snapshot.current_step);
        }
        if !snapshot.message.is_empty() {
            state.message = snapshot.message.clone();
        }
    }
    for entry in snapshot.results {
        state.push_result(entry);
    }

    match snapshot.status {
        WorkloadStatus::Failed if state.status.can_advance_to(WorkloadStatus::Failed) => {
            let reason = if snapshot.message.is_empty() {
                "no reason given"
            } else {
                snapshot.message.as_str()
            };
            state.last_error = Some(format!("Executor reported failure: {}", reason));
            finish(state, WorkloadStatus::Failed, snapshot.summary);
        }
        status if status.is_terminal() && state.status.can_advance_to(status) => {
            finish(state, status, snapshot.summary);
        }
        WorkloadStatus::Running if state.status.can_advance_to(WorkloadStatus::Running) => {
            state.status = WorkloadStatus::Running;
        }
        _ => {}
    }
}

fn apply_failure(state: &mut WorkloadState, error: WorkloadError) {
    state.last_error = Some(error.to_string());

    if error.is_fatal() {
        state.message = "Diagnostics failed".to_string();
        finish(state, WorkloadStatus::Failed, None);
    }
}

/// Moves the state into a terminal status and records the summary
fn finish(state: &mut WorkloadState, status: WorkloadStatus, summary: Option<serde_json::Value>) {
    state.status = status;
    if status == WorkloadStatus::Completed {
        state.total_steps = state.total_steps.max(state.step_index);
        state.step_index = state.total_steps;
        state.progress_percent = 100;
    }
    if state.summary.is_none() {
        state.summary = summary;
    }
}

fn raise_progress(state: &mut WorkloadState, percent: u8) {
    state.progress_percent = state.progress_percent.max(percent.min(100));
}

fn step_percent(step_index: u32, total_steps: u32) -> u8 {
    if total_steps == 0 {
        return 0;
    }
    clamp_percent(f64::from(step_index) * 100.0 / f64::from(total_steps))
}
