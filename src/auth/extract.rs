//! Credential token extraction from HTTP request headers.
//!
//! The browser client authenticates with a `token` cookie; non-browser
//! clients may use an `Authorization: Bearer` header, and the WebSocket
//! endpoint additionally accepts a `?token=` query parameter (handled at
//! the upgrade handler).

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

/// Extracts a credential token from the `token` cookie or, failing that,
/// a bearer `Authorization` header.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

/// Extracts the `token` cookie value from any `Cookie` header.
#[must_use]
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("token=").map(str::to_string))
        .filter(|token| !token.is_empty())
}

/// Extracts a bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .filter(|token| !token.is_empty())
}
