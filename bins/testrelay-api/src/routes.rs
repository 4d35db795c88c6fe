use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_tests))
        .route("/status", get(handlers::get_status))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
}
