//! Authentication extractors
//!
//! Admin routes carry the admin API key as a bearer token. Platform updates
//! carry the webhook secret in the header Telegram uses for webhooks.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::response::ApiError;
use crate::state::AppState;

/// Marker for a request carrying the admin API key
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);
        if !keys_match(bearer.token(), &app_state.config().admin.api_key) {
            tracing::warn!("Rejected admin request with a wrong API key");
            return Err(ApiError::InvalidApiKey);
        }

        Ok(AdminAuth)
    }
}

/// Header the update relay must send with every event
pub const UPDATE_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Marker for an update sent by the trusted relay
#[derive(Debug, Clone, Copy)]
pub struct UpdateAuth;

#[async_trait]
impl<S> FromRequestParts<S> for UpdateAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let given = parts
            .headers
            .get(UPDATE_SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::InvalidUpdateSecret)?;

        let app_state = AppState::from_ref(state);
        if !keys_match(given, &app_state.config().telegram.webhook_secret) {
            tracing::warn!("Rejected update with a wrong secret");
            return Err(ApiError::InvalidUpdateSecret);
        }

        Ok(UpdateAuth)
    }
}

/// Length-independent comparison of two keys
fn keys_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    let mut diff = given.len() ^ expected.len();
    for (i, byte) in expected.iter().enumerate() {
        diff |= usize::from(given.get(i).copied().unwrap_or(0) ^ byte);
    }
    diff == 0
}
