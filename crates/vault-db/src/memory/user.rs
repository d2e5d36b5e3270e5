//! In-memory implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use vault_core::{BotUser, ChatId, DomainError, RepoResult, UserRepository};

/// In-memory implementation of UserRepository
#[derive(Default)]
pub struct MemoryUserRepository {
    users: DashMap<ChatId, BotUser>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn touch(&self, id: ChatId, now: DateTime<Utc>) -> RepoResult<BotUser> {
        let mut user = self.users.entry(id).or_insert_with(|| BotUser::new(id, now));
        user.touch(now);
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: ChatId) -> RepoResult<Option<BotUser>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn add_files_received(&self, id: ChatId, count: i64) -> RepoResult<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(DomainError::UserNotFound(id))?;
        user.add_files(count);
        Ok(())
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.users.len() as i64)
    }
}
