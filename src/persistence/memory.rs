//! In-memory implementation of the store traits.
//!
//! Used in development mode (`PERSISTENCE_ENABLED=false`) and throughout
//! the test suite. Ids are assigned from a monotonic counter, mirroring
//! the BIGSERIAL contract of the PostgreSQL store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::UserRecord;
use super::{MessageStore, UserStore};
use crate::domain::{Identity, Message, MessageId, UserId};
use crate::error::GatewayError;

/// Volatile store backed by plain collections behind `RwLock`s.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    messages: RwLock<Vec<Message>>,
    next_message_id: AtomicI64,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn append(
        &self,
        sender: UserId,
        recipient: UserId,
        text: Option<String>,
        file: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Message, GatewayError> {
        let id = MessageId::from_i64(self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1);
        let message = Message {
            id,
            sender,
            recipient,
            text,
            file,
            created_at: timestamp,
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, GatewayError> {
        let messages = self.messages.read().await;
        let mut matching: Vec<Message> = messages
            .iter()
            .filter(|m| {
                (m.sender == user_a && m.recipient == user_b)
                    || (m.sender == user_b && m.recipient == user_a)
            })
            .filter(|m| since.is_none_or(|cutoff| m.created_at > cutoff))
            .cloned()
            .collect();
        matching.sort_by_key(|m| (m.created_at, m.id));
        Ok(matching)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Identity, GatewayError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(GatewayError::UsernameTaken(username.to_string()));
        }
        let record = UserRecord {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        let identity = record.identity();
        users.insert(record.id, record);
        Ok(identity)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, GatewayError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<Identity>, GatewayError> {
        let users = self.users.read().await;
        let mut identities: Vec<Identity> = users.values().map(UserRecord::identity).collect();
        identities.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(identities)
    }
}
