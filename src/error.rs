//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! WebSocket-path variants (`InvalidMessage`, `TransportGone`,
//! `LivenessTimeout`) never surface over HTTP in normal operation; they
//! exist so the router and monitor have a precise contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "unauthenticated: token expired",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                   | HTTP Status                |
/// |-----------|----------------------------|----------------------------|
/// | 1000–1999 | Validation                 | 400 / 422                  |
/// | 2000–2999 | Auth / Not Found / Conflict| 401 / 404 / 409            |
/// | 3000–3999 | Server / Store / Transport | 500 / 503                  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Inbound message event with no recipient or neither text nor file.
    /// On the WebSocket path the event is dropped silently: no persistence,
    /// no delivery attempt, nothing sent back to the sender.
    #[error("invalid message: missing recipient or body")]
    InvalidMessage,

    /// Bad, missing, or expired credential token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// User with the given name or id was not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Username is already taken by another user.
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// The message store could not persist or read; the message is not
    /// delivered when persistence fails.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Writing to an individual connection failed. Contained: other
    /// recipients and the persistence step are unaffected, and the dead
    /// connection is reclaimed by its own probe cycle.
    #[error("transport gone: connection no longer receiving")]
    TransportGone,

    /// No probe reply within the timeout window; the connection is
    /// forcibly terminated and unregistered.
    #[error("liveness timeout: no probe reply in time")]
    LivenessTimeout,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidMessage => 1002,
            Self::Unauthenticated(_) => 2001,
            Self::UserNotFound(_) => 2002,
            Self::UsernameTaken(_) => 2003,
            Self::StoreUnavailable(_) => 3001,
            Self::TransportGone => 3002,
            Self::LivenessTimeout => 3003,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidMessage => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::UsernameTaken(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::TransportGone | Self::LivenessTimeout | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
