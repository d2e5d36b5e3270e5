//! In-memory implementation of JoinRequestRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use vault_core::{ChatId, JoinRequest, JoinRequestRepository, JoinResolution, RepoResult};

/// In-memory implementation of JoinRequestRepository
#[derive(Default)]
pub struct MemoryJoinRequestRepository {
    requests: DashMap<(ChatId, ChatId), JoinRequest>,
}

impl MemoryJoinRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JoinRequestRepository for MemoryJoinRequestRepository {
    async fn upsert_pending(&self, request: &JoinRequest) -> RepoResult<()> {
        let mut pending = *request;
        pending.resolution = JoinResolution::Pending;
        pending.resolved_at = None;
        self.requests
            .insert((request.user_id, request.channel_id), pending);
        Ok(())
    }

    async fn find(&self, user_id: ChatId, channel_id: ChatId) -> RepoResult<Option<JoinRequest>> {
        Ok(self.requests.get(&(user_id, channel_id)).map(|r| *r))
    }

    async fn resolve(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        resolution: JoinResolution,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        Ok(self
            .requests
            .get_mut(&(user_id, channel_id))
            .is_some_and(|mut request| request.resolve(resolution, at)))
    }
}
