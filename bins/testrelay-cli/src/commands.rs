// CLI commands for driving a remote test host
use anyhow::{Context, Result};
use std::sync::Arc;
use testrelay_common::config::Config;
use testrelay_common::types::{RunOutcome, RunRequest, StatusSnapshot};
use testrelay_orchestrator::{TcpCommandChannel, TestOrchestrator};

fn orchestrator(config: &Config) -> TestOrchestrator {
    let channel = TcpCommandChannel::from_config(config);
    TestOrchestrator::from_config(Arc::new(channel), config)
}

/// Run tests and print the outcome. Returns whether the run succeeded.
pub async fn run_tests(
    config: &Config,
    action: &str,
    assembly: Option<&str>,
    class: Option<&str>,
    method: Option<&str>,
    timeout: i64,
    json: bool,
) -> Result<bool> {
    let mut request = RunRequest::new(action).with_timeout(timeout);
    if let Some(assembly) = assembly {
        request = request.with_assembly(assembly);
    }
    if let Some(class) = class {
        request = request.with_class(class);
    }
    if let Some(method) = method {
        request = request.with_method(method);
    }

    if !json {
        println!("🚀 Running {} on {}...", action, config.host_addr());
    }

    let outcome = orchestrator(config).run_tests(&request).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to encode outcome")?
        );
    } else {
        println!("{}", render_outcome(&outcome));
    }

    Ok(outcome.success)
}

/// Print the host's current status. Returns false if the host could not be queried.
pub async fn show_status(config: &Config, json: bool) -> Result<bool> {
    match orchestrator(config).query_status().await {
        Ok(snapshot) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&snapshot).context("Failed to encode status")?
                );
            } else {
                println!("{}", render_status(&snapshot));
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("❌ Failed to query {}: {}", config.host_addr(), e);
            Ok(false)
        }
    }
}

pub fn render_outcome(outcome: &RunOutcome) -> String {
    let mut out = if outcome.success {
        format!("✅ {}", outcome.message)
    } else {
        format!("❌ {}", outcome.message)
    };

    if let Some(data) = &outcome.data {
        out.push_str(&format!("\n   Workflow status: {}", data.workflow_status));
        if let Some(result) = &data.test_result {
            out.push_str(&format!("\n   Result: {}", result));
        }
        if let Some(summary) = &data.test_summary {
            if let Some(total) = summary.recorded_total() {
                out.push_str(&format!(
                    "\n   Tests: {} total, {} passed, {} failed",
                    total, summary.passed, summary.failed
                ));
            }
        }
    }
    out
}

pub fn render_status(snapshot: &StatusSnapshot) -> String {
    let mut out = format!("📊 Workflow status: {}", snapshot.workflow_status);
    if let Some(result) = &snapshot.test_result {
        out.push_str(&format!("\n   Last result: {}", result));
    }
    if let Some(error) = &snapshot.error_message {
        out.push_str(&format!("\n   Error: {}", error));
    }
    out
}
