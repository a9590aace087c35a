//! Resolved user identity.

use serde::{Deserialize, Serialize};

use super::UserId;

/// A user identity as yielded by the identity resolver: the stable id plus
/// the display name shown to other users.
///
/// Immutable once created; owned by the user store. The gateway never
/// mutates identities, it only attaches them to connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique user id.
    pub id: UserId,
    /// Display name (unique username).
    pub username: String,
}

impl Identity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}
