//! Platform events - updates delivered to the service by the messaging platform
//!
//! Events are serialized with a `type` tag so a webhook relay can post them as JSON:
//!
//! ```json
//! { "type": "OPEN_LINK", "user_id": 42, "token": "..." }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChatId;

/// All inbound platform events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformEvent {
    /// User opened a deep link carrying a token
    OpenLink(OpenLinkEvent),

    // =========================================================================
    // Join Request Events
    // =========================================================================
    JoinRequest(JoinRequestEvent),
    JoinRequestApproved(JoinRequestEvent),
    JoinRequestDeclined(JoinRequestEvent),
}

impl PlatformEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OpenLink(_) => "OPEN_LINK",
            Self::JoinRequest(_) => "JOIN_REQUEST",
            Self::JoinRequestApproved(_) => "JOIN_REQUEST_APPROVED",
            Self::JoinRequestDeclined(_) => "JOIN_REQUEST_DECLINED",
        }
    }

    /// User the event is about
    pub fn user_id(&self) -> ChatId {
        match self {
            Self::OpenLink(e) => e.user_id,
            Self::JoinRequest(e) | Self::JoinRequestApproved(e) | Self::JoinRequestDeclined(e) => {
                e.user_id
            }
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::OpenLink(e) => e.timestamp,
            Self::JoinRequest(e) | Self::JoinRequestApproved(e) | Self::JoinRequestDeclined(e) => {
                e.timestamp
            }
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenLinkEvent {
    pub user_id: ChatId,
    pub token: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequestEvent {
    pub user_id: ChatId,
    pub channel_id: ChatId,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}
