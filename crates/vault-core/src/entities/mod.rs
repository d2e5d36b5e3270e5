//! Domain entities - core business objects

mod channel;
mod delivery;
mod join_request;
mod subscription;
mod token;
mod user;

pub use channel::{ChannelRequirement, JoinMode};
pub use delivery::DeliveryRecord;
pub use join_request::{JoinRequest, JoinResolution};
pub use subscription::{GatingDecision, MissingChannel, SubscriptionRecord, SubscriptionStatus};
pub use token::{deep_link, generate_token, AccessToken, ArchiveFileRef, TokenUsage};
pub use user::BotUser;
