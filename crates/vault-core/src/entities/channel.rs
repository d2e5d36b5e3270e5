//! Channel requirement - a channel users must belong to before retrieving files

use serde::{Deserialize, Serialize};

use crate::value_objects::ChatId;

/// How a user becomes a member of a required channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Anyone with the link joins immediately
    #[default]
    Open,
    /// Joining creates a request that an administrator approves
    RequestGated,
}

impl JoinMode {
    /// Parse a configuration value (`open`, `request`, `request_gated`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" | "public" => Some(Self::Open),
            "request" | "request_gated" | "request-gated" | "join_request" => {
                Some(Self::RequestGated)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn is_request_gated(self) -> bool {
        matches!(self, Self::RequestGated)
    }
}

/// A required subscription channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRequirement {
    pub channel_id: ChatId,
    pub mode: JoinMode,
    pub invite_link: Option<String>,
}

impl ChannelRequirement {
    /// Create a new requirement without an explicit invite link
    pub fn new(channel_id: ChatId, mode: JoinMode) -> Self {
        Self {
            channel_id,
            mode,
            invite_link: None,
        }
    }

    /// Attach the URL users should follow to join
    pub fn with_invite_link(mut self, link: impl Into<String>) -> Self {
        let link = link.into();
        if !link.trim().is_empty() {
            self.invite_link = Some(link);
        }
        self
    }

    /// URL presented to the user in a join prompt.
    ///
    /// Falls back to the private `t.me/c/` form when no invite link is configured.
    pub fn join_url(&self) -> String {
        match &self.invite_link {
            Some(link) => link.clone(),
            None => format!("https://t.me/c/{}", self.channel_id.short_channel_id()),
        }
    }
}
