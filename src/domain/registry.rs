//! Concurrent registry of live connections, keyed by user.
//!
//! [`ConnectionRegistry`] is the single shared mutable structure of the
//! realtime core. Every mutation and every snapshot read goes through one
//! `tokio::sync::RwLock`, so readers never observe a partially-updated
//! connection set.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{ConnectionHandle, ConnectionId, Identity, UserId};

/// Multi-valued map from user to their currently open connections.
///
/// A user with several tabs holds several handles under the same key.
/// Removing the last handle for a user removes the map entry, so the key
/// set is exactly the online set.
///
/// # Concurrency
///
/// All access is serialized through the inner `RwLock`; fan-out callers
/// receive cloned handles and deliver outside the lock.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Vec<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection under its identity's connection set.
    pub async fn register(&self, handle: ConnectionHandle) {
        let user_id = handle.identity().id;
        let mut map = self.connections.write().await;
        map.entry(user_id).or_default().push(handle);
    }

    /// Removes the connection from whatever set it belongs to.
    ///
    /// Idempotent: unregistering an unknown connection is a no-op.
    /// Returns `true` when a handle was actually removed, so callers know
    /// whether a presence update is due.
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        let mut map = self.connections.write().await;
        let mut removed = false;
        map.retain(|_, handles| {
            let before = handles.len();
            handles.retain(|h| h.id() != connection_id);
            removed |= handles.len() < before;
            !handles.is_empty()
        });
        removed
    }

    /// Returns the distinct identities currently holding at least one
    /// connection, in a consistent point-in-time view.
    pub async fn snapshot(&self) -> Vec<Identity> {
        let map = self.connections.read().await;
        let mut online: Vec<Identity> = map
            .values()
            .filter_map(|handles| handles.first().map(|h| h.identity().clone()))
            .collect();
        // Stable output independent of hash order.
        online.sort_by(|a, b| a.id.cmp(&b.id));
        online
    }

    /// Returns clones of every handle belonging to the given user.
    ///
    /// Used by the router to fan a message out to all of the recipient's
    /// open connections.
    pub async fn connections_for(&self, user_id: UserId) -> Vec<ConnectionHandle> {
        let map = self.connections.read().await;
        map.get(&user_id).cloned().unwrap_or_default()
    }

    /// Returns clones of every registered handle.
    ///
    /// Used by the presence broadcaster to push the online list to all
    /// live connections.
    pub async fn all_handles(&self) -> Vec<ConnectionHandle> {
        let map = self.connections.read().await;
        map.values().flatten().cloned().collect()
    }

    /// Returns the number of distinct online users.
    pub async fn online_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
