mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use testrelay_common::config::{Config, LogFormat};
use testrelay_orchestrator::{TcpCommandChannel, TestOrchestrator};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pub orchestrator: TestOrchestrator,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    info!("TestRelay API booting...");

    let channel = TcpCommandChannel::from_config(&config);
    info!(host = %channel.addr(), retries = config.max_retries, "Test host channel configured");

    let orchestrator = TestOrchestrator::from_config(Arc::new(channel), &config)
        .with_observer(Arc::new(metrics::MetricsObserver::default()));
    let state = Arc::new(AppState { orchestrator });

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    let listener = TcpListener::bind(&config.api_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_addr))?;

    info!("HTTP server listening on {}", config.api_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("TestRelay API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
