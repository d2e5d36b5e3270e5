//! Axum extractors for request handling
//!
//! Custom extractors for admin and update authentication and validated bodies.

mod auth;
mod validated;

pub use auth::{AdminAuth, UpdateAuth, UPDATE_SECRET_HEADER};
pub use validated::{json_rejection, ValidatedJson};
