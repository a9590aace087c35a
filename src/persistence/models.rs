//! Storage records for user accounts.

use chrono::{DateTime, Utc};

use crate::domain::{Identity, UserId};

/// A stored user account row.
///
/// The password hash never leaves the persistence/auth boundary; callers
/// that only need the public part use [`UserRecord::identity`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Stable user id.
    pub id: UserId,
    /// Unique display name.
    pub username: String,
    /// PHC-format Argon2 hash of the password.
    pub password_hash: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Returns the public identity of this account.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.username.clone())
    }
}
