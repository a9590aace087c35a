//! JWT-backed identity resolver.
//!
//! Implements the `resolve(token) -> Identity | Unauthenticated` contract
//! consumed by the WebSocket upgrade path and the REST handlers, plus the
//! issuing side used by login/register.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{Identity, UserId};
use crate::error::GatewayError;

/// Claims carried inside a credential token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: UserId,
    /// Display name, embedded so resolution needs no store lookup.
    username: String,
    /// Expiry as a unix timestamp (seconds).
    exp: i64,
}

/// Verifies and issues credential tokens.
///
/// Resolution is synchronous with respect to connection setup: no message
/// is routed for a connection before `resolve` has completed or failed.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl_hours: i64,
}

impl std::fmt::Debug for JwtIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("JwtIdentityResolver")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish_non_exhaustive()
    }
}

impl JwtIdentityResolver {
    /// Creates a resolver from a shared HMAC secret.
    #[must_use]
    pub fn new(secret: &str, token_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_hours,
        }
    }

    /// Issues a signed token for the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if signing fails.
    pub fn issue(&self, identity: &Identity) -> Result<String, GatewayError> {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.token_ttl_hours)).timestamp();
        let claims = Claims {
            sub: identity.id,
            username: identity.username.clone(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| GatewayError::Internal(format!("token signing failed: {e}")))
    }

    /// Resolves a credential token to a stable user identity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthenticated`] for malformed, tampered,
    /// or expired tokens.
    pub fn resolve(&self, token: &str) -> Result<Identity, GatewayError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| GatewayError::Unauthenticated(e.to_string()))?;
        Ok(Identity::new(data.claims.sub, data.claims.username))
    }
}
