//! DTOs for the account endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Identity, UserId};

/// Body of `POST /register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired unique username.
    pub username: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Response of `POST /register` and `POST /login`; the credential token
/// itself travels in the `token` cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Id of the authenticated user.
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
}

/// Response of `GET /profile`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    /// Id of the authenticated user.
    #[serde(rename = "userId")]
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Display name.
    pub username: String,
}

impl From<Identity> for ProfileResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.id,
            username: identity.username,
        }
    }
}
