//! Route definitions
//!
//! Platform updates and admin routes are mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{health, stats, tokens, updates};
use crate::state::AppState;

/// Create the main API router (health routes are separate to bypass rate limiting)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(update_routes())
        .merge(token_routes())
        .merge(stats_routes())
}

/// Inbound platform updates
fn update_routes() -> Router<AppState> {
    Router::new().route("/updates", post(updates::handle_update))
}

/// Token issue and inspection (admin)
fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(tokens::create_token))
        .route("/tokens/range", post(tokens::create_range_token))
        .route("/tokens/:token", get(tokens::get_token))
}

/// Statistics (admin)
fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats::get_stats))
}
