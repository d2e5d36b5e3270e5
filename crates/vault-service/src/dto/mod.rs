//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs

pub mod requests;
pub mod responses;

pub use requests::{CreateRangeRequest, CreateTokenRequest};
pub use responses::{
    ApiResponse, EventResponse, HealthChecks, HealthResponse, ReadinessResponse, StatsResponse,
    TokenResponse,
};
