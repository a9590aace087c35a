//! WebSocket wire frames.
//!
//! Shapes are kept compatible with the existing browser client, including
//! its `recepient` spelling, the `_id` field carrying the store-assigned
//! message id, and presence entries keyed `userId`/`username`.

use serde::{Deserialize, Serialize};

use crate::domain::{Identity, Message, MessageId, Push, UserId};

/// Inbound message event from a client.
///
/// At least one of `text` / `file` is required; events violating that, or
/// missing a recipient, are dropped silently by the connection task.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    /// Target user id.
    #[serde(default)]
    pub recepient: Option<UserId>,
    /// Text body.
    #[serde(default)]
    pub text: Option<String>,
    /// File attachment as a base64 data URL.
    #[serde(default)]
    pub file: Option<FileAttachment>,
}

/// An attached file as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct FileAttachment {
    /// Client-side filename; only its extension is kept.
    pub name: String,
    /// Base64 data URL with the file contents.
    pub data: String,
}

/// Server-to-client frame.
///
/// Serialized untagged: the client discriminates on the presence of the
/// `online` key.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    /// Full-state presence push.
    Presence {
        /// Every identity currently holding at least one connection.
        online: Vec<OnlinePeer>,
    },
    /// A routed message.
    Message {
        /// Text body, `null` for file-only messages.
        text: Option<String>,
        /// Sending user.
        sender: UserId,
        /// Receiving user.
        recepient: UserId,
        /// Stored attachment filename, `null` for text-only messages.
        file: Option<String>,
        /// Store-assigned message id.
        #[serde(rename = "_id")]
        id: MessageId,
    },
}

/// One entry of the presence list.
#[derive(Debug, Clone, Serialize)]
pub struct OnlinePeer {
    /// User id.
    #[serde(rename = "userId")]
    pub user_id: UserId,
    /// Display name.
    pub username: String,
}

impl From<Identity> for OnlinePeer {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.id,
            username: identity.username,
        }
    }
}

impl From<Message> for ServerFrame {
    fn from(message: Message) -> Self {
        Self::Message {
            text: message.text,
            sender: message.sender,
            recepient: message.recipient,
            file: message.file,
            id: message.id,
        }
    }
}

impl From<Push> for ServerFrame {
    fn from(push: Push) -> Self {
        match push {
            Push::Presence(online) => Self::Presence {
                online: online.into_iter().map(OnlinePeer::from).collect(),
            },
            Push::Message(message) => Self::from(message),
        }
    }
}
