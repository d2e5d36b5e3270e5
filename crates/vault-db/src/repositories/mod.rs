//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in vault-core.

mod delivery;
mod error;
mod join_request;
mod token;
mod user;

pub use delivery::PgDeliveryRepository;
pub use join_request::PgJoinRequestRepository;
pub use token::PgTokenRepository;
pub use user::PgUserRepository;
