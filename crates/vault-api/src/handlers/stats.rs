//! Statistics handler

use axum::{extract::State, Json};
use vault_service::dto::{ApiResponse, StatsResponse};
use vault_service::StatsService;

use crate::extractors::AdminAuth;
use crate::response::ApiResult;
use crate::state::AppState;

/// Usage totals and counters
///
/// GET /stats
pub async fn get_stats(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> ApiResult<Json<ApiResponse<StatsResponse>>> {
    let snapshot = StatsService::new(state.service_context()).snapshot().await?;
    Ok(Json(ApiResponse::new(snapshot)))
}
