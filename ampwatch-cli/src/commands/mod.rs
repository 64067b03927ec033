//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod diagnose;
mod status;

pub use diagnose::DiagnoseArgs;
pub use status::StatusArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a diagnostic workload and follow it to the end
    Diagnose(DiagnoseArgs),
    /// Fetch one status snapshot of an existing workload
    Status(StatusArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Diagnose(args) => diagnose::handle_diagnose(args, config).await,
        Commands::Status(args) => status::handle_status(args, config).await,
    }
}
