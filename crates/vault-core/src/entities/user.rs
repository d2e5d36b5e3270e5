//! Bot user entity - anyone who has interacted with the bot

use chrono::{DateTime, Utc};

use crate::value_objects::ChatId;

/// User registry entry. Created on first interaction, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUser {
    pub id: ChatId,
    pub first_seen: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub files_received: i64,
}

impl BotUser {
    pub fn new(id: ChatId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            first_seen: now,
            last_active: now,
            files_received: 0,
        }
    }

    /// Mark activity. `last_active` never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_active {
            self.last_active = now;
        }
    }

    pub fn add_files(&mut self, count: i64) {
        self.files_received += count.max(0);
    }
}
