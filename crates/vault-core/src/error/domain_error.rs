//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::ChatId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Token not found")]
    TokenNotFound,

    #[error("User not found: {0}")]
    UserNotFound(ChatId),

    #[error("Channel is not a required channel: {0}")]
    ChannelNotRequired(ChatId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token must reference at least one file")]
    EmptyFileSet,

    #[error("Batch too large: max {max} files")]
    BatchTooLarge { max: usize },

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Token already exists")]
    TokenExists,

    #[error("Channel does not take join requests: {0}")]
    ChannelNotGated(ChatId),

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Token has expired")]
    TokenExpired,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::TokenNotFound => "UNKNOWN_TOKEN",
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::ChannelNotRequired(_) => "UNKNOWN_CHANNEL",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyFileSet => "EMPTY_FILE_SET",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",

            // Conflict
            Self::TokenExists => "TOKEN_EXISTS",
            Self::ChannelNotGated(_) => "CHANNEL_NOT_GATED",

            // Business Rules
            Self::TokenExpired => "TOKEN_EXPIRED",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::PlatformError(_) => "PLATFORM_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TokenNotFound | Self::UserNotFound(_) | Self::ChannelNotRequired(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::EmptyFileSet | Self::BatchTooLarge { .. }
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::TokenExists | Self::ChannelNotGated(_))
    }

    /// Token could not be used (unknown or expired). Never retried.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::TokenNotFound | Self::TokenExpired)
    }
}
