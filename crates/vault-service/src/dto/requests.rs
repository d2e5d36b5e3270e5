//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

use vault_core::{ChatId, MessageId};

// ============================================================================
// Token Requests
// ============================================================================

/// Issue a token for a list of archive messages
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTokenRequest {
    /// Archive message IDs, delivered in this order
    #[validate(length(min = 1, max = 100, message = "message_ids must hold 1-100 entries"))]
    pub message_ids: Vec<MessageId>,

    /// Lifetime in seconds; falls back to the configured default
    #[validate(range(min = 1, message = "expires_in must be positive"))]
    pub expires_in: Option<u64>,

    /// Admin issuing the token
    pub created_by: Option<ChatId>,
}

/// Issue a token for an inclusive range of archive messages
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRangeRequest {
    #[validate(range(min = 1, message = "first_message_id must be positive"))]
    pub first_message_id: MessageId,

    #[validate(range(min = 1, message = "last_message_id must be positive"))]
    pub last_message_id: MessageId,

    #[validate(range(min = 1, message = "expires_in must be positive"))]
    pub expires_in: Option<u64>,

    pub created_by: Option<ChatId>,
}
