//! Status command
//!
//! Fetches a single status snapshot straight from the executor.

use std::time::Duration;

use ampwatch_client::{ExecutorClient, WorkloadClient};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tracing::debug;

use crate::config::Config;

/// Arguments for `ampwatch status`
#[derive(Args)]
pub struct StatusArgs {
    /// Workload ID returned when the workload was started
    workload_id: String,

    /// Print the raw executor response as JSON
    #[arg(long)]
    json: bool,
}

/// Fetch and display one status snapshot
pub async fn handle_status(args: StatusArgs, config: &Config) -> Result<()> {
    let client = ExecutorClient::new(&config.executor_url);
    let timeout = Duration::from_secs(config.call_timeout_secs);

    debug!(workload_id = %args.workload_id, url = client.base_url(), "Fetching workload status");
    let response = match tokio::time::timeout(timeout, client.get_status(&args.workload_id))
        .await
        .with_context(|| format!("Status request timed out after {:?}", timeout))?
    {
        Ok(response) => response,
        Err(e) if e.is_not_found() => {
            anyhow::bail!("No workload with ID {} on the executor", args.workload_id)
        }
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!(
                "Failed to fetch status of workload {}",
                args.workload_id
            )));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let snapshot = response.into_snapshot();

    println!("{}", "Workload Status:".bold());
    println!("  ID:        {}", args.workload_id.cyan());
    println!("  Status:    {}", snapshot.status);
    println!(
        "  Step:      {}/{} {}",
        snapshot.step_index,
        snapshot.total_steps,
        snapshot.current_step.dimmed()
    );
    println!("  Progress:  {:.0}%", snapshot.progress.clamp(0.0, 100.0));
    if !snapshot.message.is_empty() {
        println!("  Message:   {}", snapshot.message);
    }

    if !snapshot.results.is_empty() {
        println!("\n{}", "Results:".bold());
        for entry in &snapshot.results {
            println!("  {} {}", "▸".cyan(), entry.step);
        }
    }

    if let Some(summary) = &snapshot.summary {
        println!("\n{}", "Summary:".bold());
        println!("  {}", summary);
    }

    Ok(())
}
