//! Token handlers
//!
//! Admin endpoints for issuing and inspecting access tokens.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use vault_core::ArchiveFileRef;
use vault_service::dto::{CreateRangeRequest, CreateTokenRequest, TokenResponse};
use vault_service::TokenService;

use crate::extractors::{AdminAuth, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// Issue a token for a list of archive messages
///
/// POST /tokens
pub async fn create_token(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ValidatedJson(request): ValidatedJson<CreateTokenRequest>,
) -> ApiResult<Created<Json<TokenResponse>>> {
    let ctx = state.service_context();
    let archive = ctx.config().archive_channel;
    let files = request
        .message_ids
        .iter()
        .map(|&message_id| ArchiveFileRef::new(archive, message_id))
        .collect();

    let service = TokenService::new(ctx);
    let token = service
        .create(files, request.expires_in.map(Duration::from_secs), request.created_by)
        .await?;
    Ok(Created(Json(TokenResponse::new(&token, service.link(&token)))))
}

/// Issue a token for an inclusive range of archive messages
///
/// POST /tokens/range
pub async fn create_range_token(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ValidatedJson(request): ValidatedJson<CreateRangeRequest>,
) -> ApiResult<Created<Json<TokenResponse>>> {
    let service = TokenService::new(state.service_context());
    let token = service
        .create_range(
            request.first_message_id,
            request.last_message_id,
            request.expires_in.map(Duration::from_secs),
            request.created_by,
        )
        .await?;
    Ok(Created(Json(TokenResponse::new(&token, service.link(&token)))))
}

/// Inspect a token, including whether it has expired
///
/// GET /tokens/{token}
pub async fn get_token(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(token): Path<String>,
) -> ApiResult<Json<TokenResponse>> {
    let service = TokenService::new(state.service_context());
    let token = service.find(&token).await?;
    let usage = service.usage(&token.token).await?;
    Ok(Json(
        TokenResponse::new(&token, service.link(&token)).with_usage(usage),
    ))
}
