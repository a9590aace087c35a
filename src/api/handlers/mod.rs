//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod messages;
pub mod people;
pub mod system;

use axum::Router;
use axum::http::HeaderMap;

use crate::app_state::AppState;
use crate::auth::extract::token_from_headers;
use crate::domain::Identity;
use crate::error::GatewayError;

/// Resolves the caller's identity from the request headers.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] when no token is presented
/// or the token does not verify.
pub(crate) fn require_identity(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Identity, GatewayError> {
    let token = token_from_headers(headers)
        .ok_or_else(|| GatewayError::Unauthenticated("no token".to_string()))?;
    state.resolver.resolve(&token)
}

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(people::routes())
        .merge(messages::routes())
}
