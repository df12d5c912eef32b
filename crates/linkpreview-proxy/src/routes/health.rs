//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    cached_entries: u64,
}

/// Public health check endpoint.
///
/// Returns basic service health for load balancer health checks.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "linkpreview-proxy",
        version: env!("CARGO_PKG_VERSION"),
        cached_entries: state.cache.entry_count(),
    })
}
