mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use testrelay_common::config::Config;
use testrelay_common::types::DEFAULT_TIMEOUT_SECONDS;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testrelay-cli")]
#[command(about = "TestRelay CLI - Run tests on a remote test host and wait for the result", long_about = None)]
struct Cli {
    /// Test host address (overrides TESTRELAY_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Test host port (overrides TESTRELAY_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a test run and wait for it to finish
    Run {
        /// Run mode (run_test_method, run_test_class, run_test_asmdef)
        #[arg(short, long)]
        action: String,

        /// Test assembly name
        #[arg(long)]
        assembly: Option<String>,

        /// Fully qualified test class
        #[arg(short, long)]
        class: Option<String>,

        /// Test method name
        #[arg(short, long)]
        method: Option<String>,

        /// Wait budget in seconds (clamped to 1..=600)
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECONDS, allow_negative_numbers = true)]
        timeout: i64,

        /// Print the raw JSON outcome
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show the host's current workflow status
    Status {
        /// Print the raw JSON snapshot
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let success = match cli.command {
        Commands::Run {
            action,
            assembly,
            class,
            method,
            timeout,
            json,
        } => {
            commands::run_tests(
                &config,
                &action,
                assembly.as_deref(),
                class.as_deref(),
                method.as_deref(),
                timeout,
                json,
            )
            .await?
        }
        Commands::Status { json } => commands::show_status(&config, json).await?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
