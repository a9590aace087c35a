//! Persisted messages and inbound drafts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::GatewayError;

/// Store-assigned message identifier.
///
/// Assigned at persistence time (BIGSERIAL in Postgres, monotonic counter
/// in the in-memory store) and therefore monotonic per store, which gives
/// the tie-break for messages created at the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Creates a `MessageId` from a raw row id.
    #[must_use]
    pub const fn from_i64(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw row id.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as persisted by the store: immutable once written.
///
/// Invariant: at least one of `text` / `file` is present, and sender and
/// recipient are always set. The total order per identity pair is
/// `(created_at, id)` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned id.
    pub id: MessageId,
    /// Sending user.
    pub sender: UserId,
    /// Receiving user.
    pub recipient: UserId,
    /// Text body, if any.
    pub text: Option<String>,
    /// Stored filename of the attachment, if any.
    pub file: Option<String>,
    /// Creation timestamp assigned by the router at persistence time.
    pub created_at: DateTime<Utc>,
}

/// An inbound message before persistence: what the router accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    /// Target user.
    pub recipient: UserId,
    /// Text body, if any. Empty strings are treated as absent.
    pub text: Option<String>,
    /// Stored filename of an already-saved attachment, if any.
    pub file: Option<String>,
}

impl MessageDraft {
    /// Creates a draft, normalizing an empty text body to `None`.
    #[must_use]
    pub fn new(recipient: UserId, text: Option<String>, file: Option<String>) -> Self {
        Self {
            recipient,
            text: text.filter(|t| !t.is_empty()),
            file,
        }
    }

    /// Checks the message invariant: at least one of text / file present.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidMessage`] when both body fields are
    /// absent. Callers on the WebSocket path drop the event silently.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.text.is_none() && self.file.is_none() {
            return Err(GatewayError::InvalidMessage);
        }
        Ok(())
    }
}
