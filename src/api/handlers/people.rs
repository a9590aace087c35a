//! People directory endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::PersonResponse;
use crate::app_state::AppState;
use crate::error::GatewayError;

/// `GET /people` — Every known user, for the contact list.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] when the user store cannot
/// be read.
#[utoipa::path(
    get,
    path = "/people",
    tag = "People",
    summary = "List all users",
    responses((status = 200, description = "User directory", body = Vec<PersonResponse>))
)]
pub async fn people_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonResponse>>, GatewayError> {
    let people = state.users.list().await?;
    Ok(Json(people.into_iter().map(PersonResponse::from).collect()))
}

/// People routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/people", get(people_handler))
}
