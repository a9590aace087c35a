//! Domain layer: identities, connections, messages, and the registry.
//!
//! This module contains the server-side domain model of the realtime core:
//! user identity, live connection handles with their typed push channel,
//! the persisted message record, and the connection registry that defines
//! the online set.

pub mod connection;
pub mod identity;
pub mod message;
pub mod registry;
pub mod user_id;

pub use connection::{ConnectionHandle, ConnectionId, Push};
pub use identity::Identity;
pub use message::{Message, MessageDraft, MessageId};
pub use registry::ConnectionRegistry;
pub use user_id::UserId;
