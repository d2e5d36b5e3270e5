//! In-memory implementation of TokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use vault_core::{AccessToken, DomainError, RepoResult, TokenRepository, TokenUsage};

/// In-memory implementation of TokenRepository
#[derive(Default)]
pub struct MemoryTokenRepository {
    tokens: DashMap<String, AccessToken>,
    usage: DashMap<String, TokenUsage>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn create(&self, token: &AccessToken) -> RepoResult<()> {
        match self.tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(DomainError::TokenExists),
            Entry::Vacant(vacant) => {
                vacant.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> RepoResult<Option<AccessToken>> {
        Ok(self.tokens.get(token).map(|t| t.clone()))
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.tokens.len() as i64)
    }

    async fn record_access(&self, token: &str, at: DateTime<Utc>) -> RepoResult<()> {
        if !self.tokens.contains_key(token) {
            return Err(DomainError::TokenNotFound);
        }
        self.usage.entry(token.to_string()).or_default().record(at);
        Ok(())
    }

    async fn usage(&self, token: &str) -> RepoResult<TokenUsage> {
        Ok(self.usage.get(token).map(|u| *u).unwrap_or_default())
    }

    async fn total_accesses(&self) -> RepoResult<i64> {
        Ok(self.usage.iter().map(|u| u.access_count).sum())
    }
}
