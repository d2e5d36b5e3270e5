//! In-memory repository implementations
//!
//! Backed by `DashMap`, used when no database is configured and in tests.
//! State lives only as long as the process.

mod delivery;
mod join_request;
mod token;
mod user;

pub use delivery::MemoryDeliveryRepository;
pub use join_request::MemoryJoinRequestRepository;
pub use token::MemoryTokenRepository;
pub use user::MemoryUserRepository;
