//! Bot user database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for bot_users table
#[derive(Debug, Clone, FromRow)]
pub struct BotUserModel {
    pub id: i64,
    pub first_seen: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub files_received: i64,
}
