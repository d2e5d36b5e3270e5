//! Entity to model mappers
//!
//! Conversions between domain entities (vault-core) and database models.
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod delivery;
mod join_request;
mod token;
mod user;

pub use delivery::DeliveryInsert;
pub use join_request::JoinRequestInsert;
pub use token::{access_token_from_rows, TokenFileInsert};
