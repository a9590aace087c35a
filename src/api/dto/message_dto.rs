//! DTO for message history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Message, MessageId, UserId};

/// One entry of `GET /messages/{user_id}`, matching the field names the
/// realtime push uses (`recepient`, `_id`) so the client renders both the
/// same way.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Store-assigned message id.
    #[serde(rename = "_id")]
    #[schema(value_type = i64)]
    pub id: MessageId,
    /// Sending user.
    #[schema(value_type = String, format = "uuid")]
    pub sender: UserId,
    /// Receiving user.
    #[schema(value_type = String, format = "uuid")]
    pub recepient: UserId,
    /// Text body, `null` for file-only messages.
    pub text: Option<String>,
    /// Stored attachment filename, `null` for text-only messages.
    pub file: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender: message.sender,
            recepient: message.recipient,
            text: message.text,
            file: message.file,
            created_at: message.created_at,
        }
    }
}
