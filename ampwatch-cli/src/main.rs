//! Ampwatch CLI
//!
//! Command-line front end for running battery diagnostic workloads against
//! the remote executor.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ampwatch")]
#[command(about = "Ampwatch battery diagnostics CLI", long_about = None)]
struct Cli {
    /// Diagnostic executor URL
    #[arg(
        long,
        env = "AMPWATCH_EXECUTOR_URL",
        default_value = "http://localhost:8080"
    )]
    executor_url: String,

    /// Seconds before any single executor call is abandoned
    #[arg(long, env = "AMPWATCH_CALL_TIMEOUT_SECS", default_value_t = 30)]
    call_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so progress output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ampwatch=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        executor_url: cli.executor_url,
        call_timeout_secs: cli.call_timeout_secs,
    };

    handle_command(cli.command, &config).await
}
