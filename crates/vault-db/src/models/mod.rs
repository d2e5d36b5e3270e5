//! Database models - SQLx-compatible structs for PostgreSQL tables

mod delivery;
mod join_request;
mod token;
mod user;

pub use delivery::DeliveryModel;
pub use join_request::JoinRequestModel;
pub use token::{AccessTokenModel, TokenFileModel, TokenUsageModel};
pub use user::BotUserModel;
