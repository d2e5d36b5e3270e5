//! Chat ID - Telegram-compatible signed 64-bit identifier
//!
//! Users have positive IDs. Supergroups and channels use the `-100` prefix
//! (e.g. `-1001234567890`), which matters when building `t.me/c/...` links.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Message identifier inside a single chat
pub type MessageId = i64;

/// Telegram chat identifier (user, group, or channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChatId(i64);

impl ChatId {
    /// Prefix Telegram puts in front of supergroup/channel IDs
    const CHANNEL_PREFIX: i64 = 1_000_000_000_000;

    /// Create a new ChatId from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Check if the ID is zero (unset)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if this ID belongs to a supergroup or channel
    #[inline]
    pub const fn is_channel(&self) -> bool {
        self.0 <= -Self::CHANNEL_PREFIX
    }

    /// Internal channel ID as used in `https://t.me/c/<id>` links.
    ///
    /// Strips the `-100` prefix; non-channel IDs are returned as their absolute value.
    pub fn short_channel_id(&self) -> i64 {
        if self.is_channel() {
            -self.0 - Self::CHANNEL_PREFIX
        } else {
            self.0.abs()
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, ChatIdParseError> {
        s.trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ChatIdParseError::InvalidFormat)
    }
}

/// Error when parsing a ChatId from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChatIdParseError {
    #[error("invalid chat id format")]
    InvalidFormat,
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ChatId> for i64 {
    fn from(id: ChatId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ChatId {
    type Err = ChatIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatId::parse(s)
    }
}

// Telegram IDs fit in 52 bits, so plain JSON numbers are safe
impl Serialize for ChatId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ChatIdVisitor;

        impl<'de> Visitor<'de> for ChatIdVisitor {
            type Value = ChatId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a chat ID")
            }

            fn visit_i64<E>(self, value: i64) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                Ok(ChatId(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(ChatId)
                    .map_err(|_| de::Error::custom("chat id out of range"))
            }

            fn visit_str<E>(self, value: &str) -> Result<ChatId, E>
            where
                E: de::Error,
            {
                ChatId::parse(value).map_err(|_| de::Error::custom("invalid chat id string"))
            }
        }

        deserializer.deserialize_any(ChatIdVisitor)
    }
}
