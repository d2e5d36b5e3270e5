//! In-memory implementation of DeliveryRepository

use async_trait::async_trait;
use dashmap::DashMap;

use vault_core::{ChatId, DeliveryRecord, DeliveryRepository, MessageId, RepoResult};

/// In-memory implementation of DeliveryRepository
#[derive(Default)]
pub struct MemoryDeliveryRepository {
    records: DashMap<(ChatId, MessageId), DeliveryRecord>,
}

impl MemoryDeliveryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryRepository for MemoryDeliveryRepository {
    async fn insert(&self, record: &DeliveryRecord) -> RepoResult<()> {
        self.records
            .insert((record.chat_id, record.message_id), *record);
        Ok(())
    }

    async fn remove(&self, chat_id: ChatId, message_id: MessageId) -> RepoResult<()> {
        self.records.remove(&(chat_id, message_id));
        Ok(())
    }

    async fn list_pending(&self) -> RepoResult<Vec<DeliveryRecord>> {
        let mut records: Vec<DeliveryRecord> = self.records.iter().map(|r| *r.value()).collect();
        records.sort_by_key(|r| (r.delete_at, r.chat_id, r.message_id));
        Ok(records)
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.records.len() as i64)
    }
}
