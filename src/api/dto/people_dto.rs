//! DTO for the people directory.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Identity, UserId};

/// One entry of `GET /people`, shaped as the browser client expects.
#[derive(Debug, Serialize, ToSchema)]
pub struct PersonResponse {
    /// User id.
    #[serde(rename = "_id")]
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    /// Display name.
    pub username: String,
}

impl From<Identity> for PersonResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
        }
    }
}
