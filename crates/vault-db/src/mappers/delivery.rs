//! Delivery record entity <-> model mapper

use chrono::{DateTime, Utc};
use vault_core::{ChatId, DeliveryRecord};

use crate::models::DeliveryModel;

/// Convert DeliveryModel to DeliveryRecord entity
impl From<DeliveryModel> for DeliveryRecord {
    fn from(model: DeliveryModel) -> Self {
        DeliveryRecord {
            chat_id: ChatId::new(model.chat_id),
            message_id: model.message_id,
            delivered_at: model.delivered_at,
            delete_at: model.delete_at,
        }
    }
}

/// Convert DeliveryRecord to values for database insertion
pub struct DeliveryInsert {
    pub chat_id: i64,
    pub message_id: i64,
    pub delivered_at: DateTime<Utc>,
    pub delete_at: DateTime<Utc>,
}

impl DeliveryInsert {
    pub fn new(record: &DeliveryRecord) -> Self {
        Self {
            chat_id: record.chat_id.into_inner(),
            message_id: record.message_id,
            delivered_at: record.delivered_at,
            delete_at: record.delete_at,
        }
    }
}
