//! Delivery record - a copied message waiting for automatic removal

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{ChatId, MessageId};

/// A delivered message and the instant it should be deleted.
///
/// Identified by `(chat_id, message_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub delivered_at: DateTime<Utc>,
    pub delete_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// Record a delivery made at `delivered_at` that lives for `ttl`
    pub fn new(
        chat_id: ChatId,
        message_id: MessageId,
        delivered_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            chat_id,
            message_id,
            delivered_at,
            delete_at: delivered_at + ttl,
        }
    }

    /// Check if the deletion deadline has passed
    #[inline]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.delete_at
    }

    /// Time left until the deadline, zero when overdue
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.delete_at - now).max(Duration::zero())
    }
}
