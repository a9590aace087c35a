//! Persistence layer: durable message log, user store, and blob uploads.
//!
//! The realtime core talks to storage only through the [`MessageStore`]
//! and [`UserStore`] traits, so the router is testable against the
//! in-memory implementation and production runs on PostgreSQL. Both
//! implementations serialize appends internally and support concurrent
//! reads.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod uploads;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Identity, Message, UserId};
use crate::error::GatewayError;
use models::UserRecord;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use uploads::UploadStore;

/// Durable, ordered log of messages between identity pairs.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Appends a message, assigning its unique id at persistence time.
    ///
    /// Returns the stored message (id included) so the router can fan the
    /// authoritative payload out without a second read.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the write fails;
    /// a message that cannot be persisted is never delivered.
    async fn append(
        &self,
        sender: UserId,
        recipient: UserId,
        text: Option<String>,
        file: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Message, GatewayError>;

    /// Returns the messages exchanged between the two users, ascending by
    /// creation time with ties broken by id, optionally restricted to
    /// messages created after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the read fails.
    async fn conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, GatewayError>;
}

/// Store of user accounts consumed by the auth and people endpoints.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Creates a user with a unique username, returning the new identity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UsernameTaken`] on a duplicate username and
    /// [`GatewayError::StoreUnavailable`] on storage failure.
    async fn create(&self, username: &str, password_hash: &str)
    -> Result<Identity, GatewayError>;

    /// Looks a user up by username, returning the full record (including
    /// the password hash) for credential verification.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the read fails.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, GatewayError>;

    /// Lists every known identity, for the people directory.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the read fails.
    async fn list(&self) -> Result<Vec<Identity>, GatewayError>;
}
