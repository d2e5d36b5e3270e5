//! Health check handlers
//!
//! Endpoints for liveness and readiness checks.

use axum::{extract::State, http::StatusCode, Json};
use vault_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Basic health check (liveness)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness check with dependency health
///
/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let ctx = state.service_context();

    // In-memory deployments have no database to reach
    let db_healthy = match ctx.pool() {
        Some(pool) => pool.acquire().await.is_ok(),
        None => true,
    };

    let platform_healthy = match ctx.platform().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Platform ping failed");
            false
        }
    };

    let response = ReadinessResponse::ready(db_healthy, platform_healthy, ctx.scheduler().is_running());
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
