//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vault_core::{AccessToken, ArchiveFileRef, StatEvent, TokenUsage};

use crate::services::RetrievalOutcome;

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Token Responses
// ============================================================================

/// Issued or inspected token
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub link: String,
    pub files: Vec<ArchiveFileRef>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    /// Successful deliveries through this token
    pub access_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl TokenResponse {
    pub fn new(token: &AccessToken, link: String) -> Self {
        Self {
            token: token.token.clone(),
            link,
            files: token.files.clone(),
            created_at: token.created_at,
            expires_at: token.expires_at,
            expired: token.is_expired(),
            access_count: 0,
            last_accessed_at: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.access_count = usage.access_count;
        self.last_accessed_at = usage.last_accessed_at;
        self
    }
}

// ============================================================================
// Event Responses
// ============================================================================

/// Reply to an inbound platform event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventResponse {
    /// A link was opened; carries the pipeline result
    Completed { result: RetrievalOutcome },
    /// A join-request event was recorded
    Accepted,
}

// ============================================================================
// Stats Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub users: i64,
    pub tokens: i64,
    /// Successful deliveries summed over all tokens
    pub token_accesses: i64,
    pub pending_deletions: i64,
    pub cached_subscriptions: usize,
    pub counters: HashMap<StatEvent, u64>,
    pub timestamp: DateTime<Utc>,
}

impl StatsResponse {
    pub fn new(
        users: i64,
        tokens: i64,
        token_accesses: i64,
        pending_deletions: i64,
        cached_subscriptions: usize,
        counters: HashMap<StatEvent, u64>,
    ) -> Self {
        Self {
            users,
            tokens,
            token_accesses,
            pending_deletions,
            cached_subscriptions,
            counters,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub platform: String,
    pub scheduler: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool, platform_healthy: bool, scheduler_running: bool) -> Self {
        let all_healthy = database_healthy && platform_healthy && scheduler_running;
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
                platform: if platform_healthy { "healthy" } else { "unhealthy" }.to_string(),
                scheduler: if scheduler_running { "running" } else { "stopped" }.to_string(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
