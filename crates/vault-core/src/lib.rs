//! # vault-core
//!
//! Domain layer containing entities, value objects, ports, and platform events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    deep_link, generate_token, AccessToken, ArchiveFileRef, BotUser, ChannelRequirement, DeliveryRecord,
    GatingDecision, JoinMode, JoinRequest, JoinResolution, MissingChannel, SubscriptionRecord,
    SubscriptionStatus, TokenUsage,
};
pub use error::DomainError;
pub use events::PlatformEvent;
pub use traits::{
    DeliveryRepository, JoinRequestRepository, MemberStatus, MessagingPlatform, PlatformError,
    PlatformResult, RepoResult, StatEvent, StatsSink, TokenRepository, UserRepository,
};
pub use value_objects::{ChatId, ChatIdParseError, MessageId};
