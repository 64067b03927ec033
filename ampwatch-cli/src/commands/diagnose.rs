//! Diagnose command
//!
//! Starts a diagnostic workload, follows the coordinator's merged state until
//! it is terminal, and prints the collected results.

use std::time::Duration;

use ampwatch_coordinator::WorkloadCoordinator;
use ampwatch_core::domain::workload::{WorkloadState, WorkloadStatus};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use tracing::{debug, info};

use crate::config::Config;

/// Arguments for `ampwatch diagnose`
#[derive(Args)]
pub struct DiagnoseArgs {
    /// Milliseconds between status polls
    #[arg(long, env = "AMPWATCH_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Milliseconds to pause between two successful steps
    #[arg(long, env = "AMPWATCH_STEP_DELAY_MS", default_value_t = 500)]
    step_delay_ms: u64,

    /// Backoff after the first failed step, in milliseconds; doubles per further failure
    #[arg(long, env = "AMPWATCH_BACKOFF_BASE_MS", default_value_t = 1000)]
    backoff_base_ms: u64,

    /// Consecutive step failures tolerated before giving up
    #[arg(long, env = "AMPWATCH_MAX_STEP_ERRORS", default_value_t = 3)]
    max_step_errors: u32,

    /// Print only the final state, as JSON
    #[arg(long)]
    json: bool,
}

/// Run a workload to completion
pub async fn handle_diagnose(args: DiagnoseArgs, config: &Config) -> Result<()> {
    let coordinator_config = config
        .coordinator_config()
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_inter_step_delay(Duration::from_millis(args.step_delay_ms))
        .with_backoff_base(Duration::from_millis(args.backoff_base_ms))
        .with_max_consecutive_errors(args.max_step_errors);
    coordinator_config
        .validate()
        .context("Invalid diagnose settings")?;

    let coordinator = WorkloadCoordinator::with_executor(coordinator_config);
    debug!(settings = ?coordinator.config(), "Coordinator configured");
    let mut updates = coordinator.subscribe();

    let handle = coordinator
        .start()
        .await
        .context("Failed to start diagnostic workload")?;

    if !args.json {
        println!(
            "{} {} {}",
            "Started workload".bold(),
            handle.id.cyan(),
            format!(
                "(polling every {:?})",
                coordinator.config().poll_interval
            )
            .dimmed()
        );
        println!("{}", "─".repeat(80).dimmed());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen_error: Option<String> = None;
    let final_state = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(workload_id = %handle.id, "Interrupted, cancelling workload");
                coordinator.cancel().await;
                if !args.json {
                    println!("{}", "Cancelled; the executor keeps the partial run.".yellow());
                }
                anyhow::bail!("Diagnostics cancelled by user");
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break coordinator.observe();
                }
                let state = updates.borrow_and_update().clone();
                if !args.json {
                    print_progress(&state, &mut seen_error);
                }
                if state.is_terminal() {
                    break state;
                }
            }
        }
    };

    // Releases the handle; both loops have already stopped
    coordinator.cancel().await;
    debug!(status = %final_state.status, "Workload finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&final_state)?);
    } else {
        print_report(&final_state);
    }

    if final_state.status == WorkloadStatus::Failed {
        anyhow::bail!(
            "Diagnostics failed: {}",
            final_state.last_error.as_deref().unwrap_or("no error reported")
        );
    }

    Ok(())
}

/// Print one progress line, plus any error not shown yet
fn print_progress(state: &WorkloadState, seen_error: &mut Option<String>) {
    let step = state.current_step.as_deref().unwrap_or("-");
    println!(
        "  [{:>3}%] {} {}/{}  {}  {}",
        state.progress_percent,
        colorize_status(state.status),
        state.step_index,
        state.total_steps,
        step.cyan(),
        state.message.dimmed()
    );

    if state.last_error != *seen_error {
        if let Some(error) = &state.last_error {
            println!("         {} {}", "!".yellow(), error.yellow());
        }
        *seen_error = state.last_error.clone();
    }
}

/// Print the final results and summary
fn print_report(state: &WorkloadState) {
    println!("{}", "─".repeat(80).dimmed());
    println!("{} {}", "Status:".bold(), colorize_status(state.status));

    if state.result_entries.is_empty() {
        println!("{}", "No step results were reported.".yellow());
    } else {
        println!("\n{}", "Results:".bold());
        for entry in &state.result_entries {
            println!("  {} {}", "▸".cyan(), entry.step);
            if let Some(detail) = &entry.detail {
                println!("      {}", detail.to_string().dimmed());
            }
            if let Some(warning) = &entry.warning {
                println!("      {} {}", "⚠".yellow(), warning.yellow());
            }
        }
    }

    if let Some(summary) = &state.summary {
        println!("\n{}", "Summary:".bold());
        let pretty = serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string());
        for line in pretty.lines() {
            println!("  {}", line);
        }
    }

    if let Some(error) = &state.last_error {
        println!("\n{} {}", "Last error:".bold(), error.red());
    }
}

/// Colorize a workload status for display
fn colorize_status(status: WorkloadStatus) -> ColoredString {
    match status {
        WorkloadStatus::Pending => "pending".yellow(),
        WorkloadStatus::Running => "running".blue(),
        WorkloadStatus::Completed => "completed".green(),
        WorkloadStatus::Failed => "failed".red(),
    }
}
