//! Join request ledger entry for request-gated channels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChatId;

/// Resolution state of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinResolution {
    Pending,
    Approved,
    Declined,
}

impl JoinResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// A user's request to join a request-gated channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequest {
    pub user_id: ChatId,
    pub channel_id: ChatId,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: JoinResolution,
}

impl JoinRequest {
    /// Open a new pending request
    pub fn new(user_id: ChatId, channel_id: ChatId, requested_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            channel_id,
            requested_at,
            resolved_at: None,
            resolution: JoinResolution::Pending,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.resolution, JoinResolution::Pending)
    }

    /// Close the request. Already resolved requests are left untouched.
    pub fn resolve(&mut self, resolution: JoinResolution, at: DateTime<Utc>) -> bool {
        if !self.is_pending() || resolution == JoinResolution::Pending {
            return false;
        }
        self.resolution = resolution;
        self.resolved_at = Some(at);
        true
    }
}
