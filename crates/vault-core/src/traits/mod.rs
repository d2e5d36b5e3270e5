//! Ports - interfaces the domain needs from infrastructure

mod platform;
mod repositories;
mod stats;

pub use platform::{MemberStatus, MessagingPlatform, PlatformError, PlatformResult};
pub use repositories::{
    DeliveryRepository, JoinRequestRepository, RepoResult, TokenRepository, UserRepository,
};
pub use stats::{StatEvent, StatsSink};
