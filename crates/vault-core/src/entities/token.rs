//! Access token - opaque handle that resolves to an ordered set of archive files

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ChatId, MessageId};

/// Number of random bytes behind each token (144 bits)
const TOKEN_BYTES: usize = 18;

/// Reference to a stored message in the archive channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveFileRef {
    pub channel_id: ChatId,
    pub message_id: MessageId,
}

impl ArchiveFileRef {
    #[inline]
    pub const fn new(channel_id: ChatId, message_id: MessageId) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

/// Access token entity. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub files: Vec<ArchiveFileRef>,
    pub created_by: Option<ChatId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Issue a fresh token for the given files
    ///
    /// # Errors
    /// Returns `EmptyFileSet` when `files` is empty.
    pub fn issue(files: Vec<ArchiveFileRef>) -> Result<Self, DomainError> {
        if files.is_empty() {
            return Err(DomainError::EmptyFileSet);
        }
        Ok(Self {
            token: generate_token(),
            files,
            created_by: None,
            created_at: Utc::now(),
            expires_at: None,
        })
    }

    /// Expire the token `ttl` after creation. Non-positive durations are ignored.
    pub fn with_expiration(mut self, ttl: Duration) -> Self {
        if ttl > Duration::zero() {
            self.expires_at = Some(self.created_at + ttl);
        }
        self
    }

    /// Record who issued the token
    pub fn with_creator(mut self, creator: ChatId) -> Self {
        self.created_by = Some(creator);
        self
    }

    /// Check expiry against the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Check expiry against the current wall clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    #[inline]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Deep link that opens the bot with this token as the start parameter
    pub fn deep_link(&self, bot_username: &str) -> String {
        deep_link(bot_username, &self.token)
    }

    /// Cheap shape check before hitting storage
    pub fn is_well_formed(token: &str) -> bool {
        (8..=64).contains(&token.len())
            && token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

/// How often a token has been used to deliver files
///
/// Kept apart from [`AccessToken`], which never changes after it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub access_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl TokenUsage {
    /// Count one more successful delivery at `at`
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed_at = Some(self.last_accessed_at.map_or(at, |last| last.max(at)));
    }
}

/// Deep link that starts `bot_username` with `token` as the payload
pub fn deep_link(bot_username: &str, token: &str) -> String {
    format!(
        "https://t.me/{}?start={token}",
        bot_username.trim_start_matches('@')
    )
}

/// Generate a URL-safe random token
pub fn generate_token() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
