//! Live connection handles and the typed pushes they receive.
//!
//! Each WebSocket connection task owns the receiving half of an unbounded
//! mpsc channel; the [`ConnectionHandle`] stored in the registry carries
//! the sending half. All server-to-client traffic flows through the handle
//! as typed [`Push`] values, never as shared socket access.

use std::fmt;

use tokio::sync::mpsc;

use super::{Identity, Message};
use crate::error::GatewayError;

/// Unique identifier for one live transport session.
///
/// A user with several tabs open holds several connections, each with its
/// own `ConnectionId`. Used by the registry to remove exactly the right
/// handle on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-to-client push delivered to a connection task.
#[derive(Debug, Clone)]
pub enum Push {
    /// Full-state presence update: every currently online identity.
    Presence(Vec<Identity>),
    /// A routed message addressed to this connection's identity.
    Message(Message),
}

/// Registry-side handle to one live connection.
///
/// Cloneable; the registry hands out clones for fan-out so that delivery
/// happens outside the registry lock.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    identity: Identity,
    outbox: mpsc::UnboundedSender<Push>,
}

impl ConnectionHandle {
    /// Creates a handle from the connection's id, resolved identity, and
    /// the sending half of its outbox channel.
    #[must_use]
    pub fn new(id: ConnectionId, identity: Identity, outbox: mpsc::UnboundedSender<Push>) -> Self {
        Self {
            id,
            identity,
            outbox,
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the identity attached to this connection.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Queues a push for delivery to this connection.
    ///
    /// Best-effort: the write to the underlying socket happens in the
    /// connection task. A closed outbox means the task has already exited.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransportGone`] when the connection task is
    /// no longer receiving.
    pub fn push(&self, push: Push) -> Result<(), GatewayError> {
        self.outbox
            .send(push)
            .map_err(|_| GatewayError::TransportGone)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    fn identity() -> Identity {
        Identity::new(UserId::new(), "alice")
    }

    #[test]
    fn push_reaches_the_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(ConnectionId::new(), identity(), tx);

        let result = handle.push(Push::Presence(vec![identity()]));
        assert!(result.is_ok());

        let Ok(received) = rx.try_recv() else {
            panic!("push was not delivered");
        };
        assert!(matches!(received, Push::Presence(_)));
    }

    #[test]
    fn push_to_dropped_receiver_is_transport_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = ConnectionHandle::new(ConnectionId::new(), identity(), tx);

        let result = handle.push(Push::Presence(vec![]));
        assert!(matches!(result, Err(GatewayError::TransportGone)));
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
