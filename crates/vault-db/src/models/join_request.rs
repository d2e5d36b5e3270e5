//! Join request database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for join_requests table
#[derive(Debug, Clone, FromRow)]
pub struct JoinRequestModel {
    pub user_id: i64,
    pub channel_id: i64,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: String,
}
