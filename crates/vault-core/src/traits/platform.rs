//! Messaging platform port - the thin client contract the pipeline depends on

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::ArchiveFileRef;
use crate::value_objects::{ChatId, MessageId};

/// Result type for platform calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// A user's standing in a chat as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// Anyone who has not left or been removed counts as joined
    #[inline]
    pub fn is_joined(self) -> bool {
        !matches!(self, Self::Left | Self::Kicked)
    }
}

/// Platform call failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    // =========================================================================
    // Transient
    // =========================================================================
    #[error("platform request timed out")]
    Timeout,

    #[error("rate limited by platform (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("platform unavailable: {0}")]
    Unavailable(String),

    // =========================================================================
    // Permanent
    // =========================================================================
    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl PlatformError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited { .. } | Self::Unavailable(_)
        )
    }
}

/// Operations the service needs from the messaging platform
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    /// Current membership of `user_id` in `channel_id`
    async fn check_membership(
        &self,
        channel_id: ChatId,
        user_id: ChatId,
    ) -> PlatformResult<MemberStatus>;

    /// Copy an archived message into `to`, returning the new message ID
    async fn copy_message(
        &self,
        from: ArchiveFileRef,
        to: ChatId,
        protect_content: bool,
    ) -> PlatformResult<MessageId>;

    /// Delete a message from a chat
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()>;

    /// Send a plain text message
    async fn send_message(&self, chat_id: ChatId, text: &str) -> PlatformResult<MessageId>;

    /// Cheap reachability check used by readiness
    async fn ping(&self) -> PlatformResult<()>;
}
