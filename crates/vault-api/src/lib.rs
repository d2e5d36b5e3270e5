//! # vault-api
//!
//! REST API server built with Axum framework.
//!
//! Receives platform updates (deep-link opens and join-request events),
//! exposes the admin surface for issuing tokens, and owns the Telegram
//! Bot API client used by the services.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod platform;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use platform::TelegramClient;
pub use server::{create_app, create_app_state, run};
pub use state::AppState;
