// HTTP route handlers for the TestRelay API

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use testrelay_common::types::{RunOutcome, RunRequest};
use tracing::{error, info};

use crate::metrics;
use crate::AppState;

/// POST /run - Run tests on the host and wait for the outcome
pub async fn run_tests(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> impl IntoResponse {
    let (status, outcome) = match state.orchestrator.try_run_tests(&request).await {
        Ok(outcome) => (StatusCode::OK, outcome),
        Err(e) => (StatusCode::BAD_REQUEST, RunOutcome::failure(e.to_string())),
    };
    info!(
        action = %request.action,
        success = outcome.success,
        "Run finished"
    );

    (status, Json(outcome))
}

/// GET /status - Current workflow status of the test host
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator.query_status().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to query host status");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "error": format!("Failed to query host status: {}", e)
                })),
            )
                .into_response()
        }
    }
}

/// GET /health - Liveness of the API process
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus scrape endpoint
pub async fn metrics() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
