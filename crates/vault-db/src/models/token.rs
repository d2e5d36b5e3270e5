//! Access token database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for access_tokens table
#[derive(Debug, Clone, FromRow)]
pub struct AccessTokenModel {
    pub token: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Database model for access_token_files table
#[derive(Debug, Clone, FromRow)]
pub struct TokenFileModel {
    pub position: i32,
    pub channel_id: i64,
    pub message_id: i64,
}

/// Database model for access_token_usage table
#[derive(Debug, Clone, FromRow)]
pub struct TokenUsageModel {
    pub access_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}
