//! Platform update handler
//!
//! Receives one platform event per request. Opening a link runs the whole
//! retrieval pipeline before answering; join-request events are applied and
//! acknowledged.
//!
//! The event runs on its own task. If the client goes away the handler
//! future is dropped, which cancels the token; the task finishes the platform
//! call in flight and stops at its next checkpoint without recording anything.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use vault_core::PlatformEvent;
use vault_service::dto::EventResponse;
use vault_service::{EventOutcome, EventService};

use crate::extractors::{json_rejection, UpdateAuth};
use crate::response::{Accepted, ApiError, ApiResult};
use crate::state::AppState;

/// Handle an inbound platform event
///
/// POST /updates
pub async fn handle_update(
    State(state): State<AppState>,
    _auth: UpdateAuth,
    body: Result<Json<PlatformEvent>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(event) = body.map_err(json_rejection)?;

    let cancel = state.shutdown().child_token();
    let _guard = cancel.clone().drop_guard();

    let ctx = state.service_context().clone();
    let task = tokio::spawn(async move { EventService::new(&ctx).handle(event, &cancel).await });

    let outcome = task.await.map_err(ApiError::internal)??;

    Ok(match outcome {
        EventOutcome::Retrieval(result) => Json(EventResponse::Completed { result }).into_response(),
        EventOutcome::Applied => Accepted(Json(EventResponse::Accepted)).into_response(),
    })
}
