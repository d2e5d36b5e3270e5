//! Subscription state and gating decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::channel::{ChannelRequirement, JoinMode};
use crate::value_objects::ChatId;

/// Membership status of a user in one required channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Member,
    /// Join request submitted to a request-gated channel, not yet approved
    Pending,
    NotMember,
}

impl SubscriptionStatus {
    #[inline]
    pub fn is_member(self) -> bool {
        matches!(self, Self::Member)
    }
}

/// Last known status for a (user, channel) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub user_id: ChatId,
    pub channel_id: ChatId,
    pub status: SubscriptionStatus,
    pub checked_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn new(
        user_id: ChatId,
        channel_id: ChatId,
        status: SubscriptionStatus,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            channel_id,
            status,
            checked_at,
        }
    }
}

/// A required channel the user has not satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingChannel {
    pub channel_id: ChatId,
    pub mode: JoinMode,
    pub status: SubscriptionStatus,
    pub join_url: String,
}

impl MissingChannel {
    pub fn new(requirement: &ChannelRequirement, status: SubscriptionStatus) -> Self {
        Self {
            channel_id: requirement.channel_id,
            mode: requirement.mode,
            status,
            join_url: requirement.join_url(),
        }
    }
}

/// Outcome of checking a user against every required channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GatingDecision {
    Granted,
    /// Missing channels, in configured order
    Denied { missing: Vec<MissingChannel> },
}

impl GatingDecision {
    /// Build a decision from the collected missing channels
    pub fn from_missing(missing: Vec<MissingChannel>) -> Self {
        if missing.is_empty() {
            Self::Granted
        } else {
            Self::Denied { missing }
        }
    }

    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Channel IDs still to be joined
    pub fn missing_ids(&self) -> Vec<ChatId> {
        match self {
            Self::Granted => Vec::new(),
            Self::Denied { missing } => missing.iter().map(|m| m.channel_id).collect(),
        }
    }
}
