//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::auth::extract::token_from_headers;
use crate::error::GatewayError;

/// Query parameters accepted by the WebSocket endpoint.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Credential token; browser clients usually send the cookie instead.
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /ws` — Upgrade to WebSocket.
///
/// Identity resolution happens before the upgrade, synchronously with
/// connection setup: a connection with a bad or missing token is rejected
/// with 401 and is never registered as online.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.or_else(|| token_from_headers(&headers));
    let Some(token) = token else {
        return GatewayError::Unauthenticated("no token".to_string()).into_response();
    };

    match state.resolver.resolve(&token) {
        Ok(identity) => ws
            .on_upgrade(move |socket| run_connection(socket, identity, state))
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "ws upgrade rejected");
            err.into_response()
        }
    }
}
