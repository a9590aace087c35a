//! Message history endpoint.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use super::require_identity;
use crate::api::dto::MessageResponse;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::GatewayError;

/// `GET /messages/{user_id}` — Conversation between the authenticated
/// user and `user_id`, ascending by creation time.
///
/// This is the authoritative history view: clients re-fetch it after
/// sending a file, since the optimistic local echo cannot know the stored
/// filename.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] without a valid token and
/// [`GatewayError::StoreUnavailable`] when the log cannot be read.
#[utoipa::path(
    get,
    path = "/messages/{user_id}",
    tag = "Messages",
    summary = "Conversation history with a user",
    params(("user_id" = String, Path, description = "The other participant")),
    responses(
        (status = 200, description = "Messages in persisted order", body = Vec<MessageResponse>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn messages_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageResponse>>, GatewayError> {
    let me = require_identity(&state, &headers)?;
    let other = UserId::from_uuid(user_id);

    let conversation = state.messages.conversation(me.id, other, None).await?;
    Ok(Json(
        conversation.into_iter().map(MessageResponse::from).collect(),
    ))
}

/// Message routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages/{user_id}", get(messages_handler))
}
