//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL or in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    AccessToken, BotUser, DeliveryRecord, JoinRequest, JoinResolution, TokenUsage,
};
use crate::error::DomainError;
use crate::value_objects::{ChatId, MessageId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Token Repository
// ============================================================================

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a new token with its files. Fails with `TokenExists` on collision.
    async fn create(&self, token: &AccessToken) -> RepoResult<()>;

    /// Find token by its opaque string. Must not mutate anything.
    async fn find_by_token(&self, token: &str) -> RepoResult<Option<AccessToken>>;

    /// Total number of issued tokens
    async fn count(&self) -> RepoResult<i64>;

    /// Count one successful delivery through `token`
    async fn record_access(&self, token: &str, at: DateTime<Utc>) -> RepoResult<()>;

    /// Usage of one token, zero when never used
    async fn usage(&self, token: &str) -> RepoResult<TokenUsage>;

    /// Sum of deliveries over all tokens
    async fn total_accesses(&self) -> RepoResult<i64>;
}

// ============================================================================
// Delivery Repository
// ============================================================================

#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Persist a pending deletion (upsert on chat + message)
    async fn insert(&self, record: &DeliveryRecord) -> RepoResult<()>;

    /// Remove a record once its deletion fired or gave up
    async fn remove(&self, chat_id: ChatId, message_id: MessageId) -> RepoResult<()>;

    /// All pending records, earliest deadline first
    async fn list_pending(&self) -> RepoResult<Vec<DeliveryRecord>>;

    /// Number of pending records
    async fn count(&self) -> RepoResult<i64>;
}

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register the user if new, otherwise bump `last_active`
    async fn touch(&self, id: ChatId, now: DateTime<Utc>) -> RepoResult<BotUser>;

    /// Find user by ID
    async fn find_by_id(&self, id: ChatId) -> RepoResult<Option<BotUser>>;

    /// Add to the user's delivered-files counter
    async fn add_files_received(&self, id: ChatId, count: i64) -> RepoResult<()>;

    /// Total number of known users
    async fn count(&self) -> RepoResult<i64>;
}

// ============================================================================
// Join Request Repository
// ============================================================================

#[async_trait]
pub trait JoinRequestRepository: Send + Sync {
    /// Record a new pending request, replacing any earlier one for the same pair
    async fn upsert_pending(&self, request: &JoinRequest) -> RepoResult<()>;

    /// Find the latest request for a (user, channel) pair
    async fn find(&self, user_id: ChatId, channel_id: ChatId) -> RepoResult<Option<JoinRequest>>;

    /// Close a pending request. Returns false if nothing was pending.
    async fn resolve(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        resolution: JoinResolution,
        at: DateTime<Utc>,
    ) -> RepoResult<bool>;
}
