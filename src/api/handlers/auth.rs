//! Account endpoints: register, login, logout, profile.
//!
//! The credential token is delivered as a `token` cookie so the browser
//! client sends it implicitly on both REST calls and the WebSocket
//! upgrade.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::SET_COOKIE};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::require_identity;
use crate::api::dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest};
use crate::app_state::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::error::GatewayError;

/// Builds the `Set-Cookie` value carrying a fresh token.
fn auth_cookie(token: &str) -> String {
    format!("token={token}; Path=/; SameSite=None; Secure; HttpOnly")
}

/// Builds the `Set-Cookie` value that clears the token.
fn clear_cookie() -> String {
    "token=; Path=/; Max-Age=0; SameSite=None; Secure; HttpOnly".to_string()
}

/// `POST /register` — Create an account and log it in.
///
/// # Errors
///
/// Returns [`GatewayError::UsernameTaken`] on a duplicate username and
/// [`GatewayError::InvalidRequest`] on empty credentials.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    summary = "Register a new user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; token cookie set", body = AuthResponse),
        (status = 409, description = "Username already taken"),
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if body.username.is_empty() || body.password.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "username and password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&body.password)?;
    let identity = state.users.create(&body.username, &password_hash).await?;
    let token = state.resolver.issue(&identity)?;

    tracing::info!(user = %identity, "user registered");
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, auth_cookie(&token))]),
        Json(AuthResponse { id: identity.id }),
    ))
}

/// `POST /login` — Authenticate and set the token cookie.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] for an unknown user or a
/// wrong password.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; token cookie set", body = AuthResponse),
        (status = 401, description = "Unknown user or wrong password"),
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let record = state
        .users
        .find_by_username(&body.username)
        .await?
        .ok_or_else(|| GatewayError::Unauthenticated("unknown user".to_string()))?;

    if !verify_password(&body.password, &record.password_hash) {
        return Err(GatewayError::Unauthenticated("wrong password".to_string()));
    }

    let identity = record.identity();
    let token = state.resolver.issue(&identity)?;

    tracing::info!(user = %identity, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, auth_cookie(&token))]),
        Json(AuthResponse { id: identity.id }),
    ))
}

/// `POST /logout` — Clear the token cookie.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    summary = "Log out",
    responses((status = 200, description = "Token cookie cleared"))
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_cookie())]),
        Json("ok"),
    )
}

/// `GET /profile` — Identity behind the presented token.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthenticated`] when no valid token is
/// presented.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    summary = "Current user profile",
    responses(
        (status = 200, description = "Resolved identity", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, GatewayError> {
    let identity = require_identity(&state, &headers)?;
    Ok(Json(ProfileResponse::from(identity)))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/profile", get(profile_handler))
}
