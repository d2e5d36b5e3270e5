//! Delivery queue database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for delivery_queue table
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryModel {
    pub chat_id: i64,
    pub message_id: i64,
    pub delivered_at: DateTime<Utc>,
    pub delete_at: DateTime<Utc>,
}
