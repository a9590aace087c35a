//! Chat service: message routing and presence broadcast.
//!
//! Orchestration layer of the realtime core. Owns references to the
//! [`ConnectionRegistry`] for the online set and to the message store for
//! durability. Every routed message follows the pattern: validate →
//! persist → fan out; every membership change follows register/unregister
//! → full-state presence broadcast.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, Identity, Message, MessageDraft, Push,
};
use crate::error::GatewayError;
use crate::persistence::MessageStore;

/// Routes messages and broadcasts presence.
#[derive(Debug, Clone)]
pub struct ChatService {
    registry: Arc<ConnectionRegistry>,
    messages: Arc<dyn MessageStore>,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, messages: Arc<dyn MessageStore>) -> Self {
        Self { registry, messages }
    }

    /// Returns a reference to the inner [`ConnectionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Registers a connection that has completed identity resolution and
    /// pushes a fresh presence snapshot to every live connection.
    pub async fn join(&self, handle: ConnectionHandle) {
        tracing::info!(user = %handle.identity(), connection = %handle.id(), "connection joined");
        self.registry.register(handle).await;
        self.broadcast_presence().await;
    }

    /// Removes a connection (clean close or eviction) and, if it was still
    /// registered, pushes a presence update after the removal completes.
    ///
    /// Idempotent: a second `leave` for the same connection does nothing
    /// and triggers no broadcast.
    pub async fn leave(&self, connection_id: ConnectionId) {
        if self.registry.unregister(connection_id).await {
            tracing::info!(connection = %connection_id, "connection left");
            self.broadcast_presence().await;
        }
    }

    /// Persists a message and fans it out to every connection of the
    /// recipient.
    ///
    /// Delivery is best-effort per connection: a failed push is logged and
    /// does not affect other connections nor the already-completed persist
    /// step (the dead connection is reclaimed by its own probe cycle). No
    /// acknowledgment is sent back to the sender.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidMessage`] when the draft carries
    /// neither text nor file, and [`GatewayError::StoreUnavailable`] when
    /// persistence fails; in both cases nothing is delivered.
    pub async fn route(
        &self,
        sender: &Identity,
        draft: MessageDraft,
    ) -> Result<Message, GatewayError> {
        draft.validate()?;

        let message = self
            .messages
            .append(sender.id, draft.recipient, draft.text, draft.file, Utc::now())
            .await?;

        let recipients = self.registry.connections_for(draft.recipient).await;
        tracing::debug!(
            id = %message.id,
            sender = %sender.id,
            recipient = %message.recipient,
            connections = recipients.len(),
            "message routed"
        );
        for handle in recipients {
            if handle.push(Push::Message(message.clone())).is_err() {
                tracing::warn!(
                    connection = %handle.id(),
                    "delivery failed; connection will be reclaimed by its probe cycle"
                );
            }
        }

        Ok(message)
    }

    /// Pushes the full online-identity list to every live connection.
    ///
    /// Always full-state, never a delta; pushing the same snapshot twice
    /// is harmless.
    pub async fn broadcast_presence(&self) {
        let online = self.registry.snapshot().await;
        let handles = self.registry.all_handles().await;
        tracing::debug!(online = online.len(), connections = handles.len(), "presence broadcast");
        for handle in handles {
            if handle.push(Push::Presence(online.clone())).is_err() {
                tracing::debug!(connection = %handle.id(), "presence push to closed connection");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::sync::mpsc;

    use crate::domain::UserId;
    use crate::persistence::InMemoryStore;

    /// Store whose writes always fail, for the persistence-failure path.
    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl MessageStore for FailingStore {
        async fn append(
            &self,
            _sender: UserId,
            _recipient: UserId,
            _text: Option<String>,
            _file: Option<String>,
            _timestamp: DateTime<Utc>,
        ) -> Result<Message, GatewayError> {
            Err(GatewayError::StoreUnavailable("down for the test".to_string()))
        }

        async fn conversation(
            &self,
            _user_a: UserId,
            _user_b: UserId,
            _since: Option<DateTime<Utc>>,
        ) -> Result<Vec<Message>, GatewayError> {
            Ok(vec![])
        }
    }

    fn service_with(store: Arc<dyn MessageStore>) -> ChatService {
        ChatService::new(Arc::new(ConnectionRegistry::new()), store)
    }

    async fn join(
        service: &ChatService,
        identity: &Identity,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<Push>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        service
            .join(ConnectionHandle::new(id, identity.clone(), tx))
            .await;
        (id, rx)
    }

    fn drain_presence(rx: &mut mpsc::UnboundedReceiver<Push>) -> Vec<Vec<Identity>> {
        let mut snapshots = Vec::new();
        while let Ok(push) = rx.try_recv() {
            if let Push::Presence(online) = push {
                snapshots.push(online);
            }
        }
        snapshots
    }

    #[tokio::test]
    async fn route_persists_then_delivers() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone());
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (_, mut bob_rx) = join(&service, &bob).await;
        let _ = drain_presence(&mut bob_rx);

        let draft = MessageDraft::new(bob.id, Some("hi".to_string()), None);
        let Ok(routed) = service.route(&alice, draft).await else {
            panic!("routing failed");
        };

        // Persisted exactly once, in order.
        let Ok(stored) = store.conversation(alice.id, bob.id, None).await else {
            panic!("query failed");
        };
        assert_eq!(stored, vec![routed.clone()]);

        // Delivered to the recipient connection.
        let Ok(Push::Message(delivered)) = bob_rx.try_recv() else {
            panic!("no delivery");
        };
        assert_eq!(delivered, routed);
    }

    #[tokio::test]
    async fn route_fans_out_to_all_recipient_connections_only() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store);
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (_, mut bob_tab1) = join(&service, &bob).await;
        let (_, mut bob_tab2) = join(&service, &bob).await;
        let (_, mut alice_rx) = join(&service, &alice).await;
        let _ = drain_presence(&mut bob_tab1);
        let _ = drain_presence(&mut bob_tab2);
        let _ = drain_presence(&mut alice_rx);

        let draft = MessageDraft::new(bob.id, Some("hello".to_string()), None);
        let Ok(_) = service.route(&alice, draft).await else {
            panic!("routing failed");
        };

        assert!(matches!(bob_tab1.try_recv(), Ok(Push::Message(_))));
        assert!(matches!(bob_tab2.try_recv(), Ok(Push::Message(_))));
        // The sender gets no echo over the push channel.
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn invalid_draft_is_not_persisted_nor_delivered() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone());
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (_, mut bob_rx) = join(&service, &bob).await;
        let _ = drain_presence(&mut bob_rx);

        let draft = MessageDraft::new(bob.id, None, None);
        assert!(matches!(
            service.route(&alice, draft).await,
            Err(GatewayError::InvalidMessage)
        ));

        let Ok(stored) = store.conversation(alice.id, bob.id, None).await else {
            panic!("query failed");
        };
        assert!(stored.is_empty());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn store_failure_prevents_delivery() {
        let service = service_with(Arc::new(FailingStore));
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (_, mut bob_rx) = join(&service, &bob).await;
        let _ = drain_presence(&mut bob_rx);

        let draft = MessageDraft::new(bob.id, Some("lost".to_string()), None);
        assert!(matches!(
            service.route(&alice, draft).await,
            Err(GatewayError::StoreUnavailable(_))
        ));
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_broadcasts_presence_to_everyone() {
        let service = service_with(Arc::new(InMemoryStore::new()));
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");

        let (_, mut alice_rx) = join(&service, &alice).await;
        let (_, mut bob_rx) = join(&service, &bob).await;

        // Alice saw both the solo snapshot and the two-user snapshot.
        let alice_snapshots = drain_presence(&mut alice_rx);
        assert_eq!(alice_snapshots.first().map(Vec::len), Some(1));
        assert_eq!(alice_snapshots.last().map(Vec::len), Some(2));

        // Bob joined second and saw the two-user snapshot.
        let bob_snapshots = drain_presence(&mut bob_rx);
        assert_eq!(bob_snapshots.last().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn leave_broadcasts_once_and_is_idempotent() {
        let service = service_with(Arc::new(InMemoryStore::new()));
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (alice_conn, _alice_rx) = join(&service, &alice).await;
        let (_, mut bob_rx) = join(&service, &bob).await;
        let _ = drain_presence(&mut bob_rx);

        service.leave(alice_conn).await;
        let after_leave = drain_presence(&mut bob_rx);
        assert_eq!(after_leave.len(), 1);
        assert_eq!(after_leave.first().map(Vec::len), Some(1));

        service.leave(alice_conn).await;
        assert!(drain_presence(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn multi_connection_user_stays_online_after_one_leave() {
        let service = service_with(Arc::new(InMemoryStore::new()));
        let alice = Identity::new(UserId::new(), "alice");
        let bob = Identity::new(UserId::new(), "bob");
        let (tab1, _rx1) = join(&service, &alice).await;
        let (_tab2, _rx2) = join(&service, &alice).await;
        let (_, mut bob_rx) = join(&service, &bob).await;
        let _ = drain_presence(&mut bob_rx);

        service.leave(tab1).await;

        let snapshots = drain_presence(&mut bob_rx);
        let Some(online) = snapshots.last() else {
            panic!("no presence broadcast after leave");
        };
        assert!(online.iter().any(|i| i.id == alice.id));
    }
}
