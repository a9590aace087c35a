//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::UserRecord;
use super::{MessageStore, UserStore};
use crate::config::GatewayConfig;
use crate::domain::{Identity, Message, MessageId, UserId};
use crate::error::GatewayError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// Appends are serialized by the database; ordering per identity pair is
/// `ORDER BY created_at, id`, where `id` is a BIGSERIAL assigned at
/// insertion time.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool per the gateway configuration and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the pool cannot be
    /// established or a migration fails.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    async fn append(
        &self,
        sender: UserId,
        recipient: UserId,
        text: Option<String>,
        file: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Message, GatewayError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO messages (sender_id, recipient_id, body, file_name, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(sender.as_uuid())
        .bind(recipient.as_uuid())
        .bind(&text)
        .bind(&file)
        .bind(timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(Message {
            id: MessageId::from_i64(id),
            sender,
            recipient,
            text,
            file,
            created_at: timestamp,
        })
    }

    async fn conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, Uuid, Option<String>, Option<String>, DateTime<Utc>)>(
            "SELECT id, sender_id, recipient_id, body, file_name, created_at FROM messages \
             WHERE sender_id = ANY(ARRAY[$1, $2]) AND recipient_id = ANY(ARRAY[$1, $2]) \
               AND ($3::timestamptz IS NULL OR created_at > $3) \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_a.as_uuid())
        .bind(user_b.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, sender, recipient, text, file, created_at)| Message {
                id: MessageId::from_i64(id),
                sender: UserId::from_uuid(sender),
                recipient: UserId::from_uuid(recipient),
                text,
                file,
                created_at,
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Identity, GatewayError> {
        let id = UserId::new();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.as_uuid())
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                GatewayError::UsernameTaken(username.to_string())
            } else {
                GatewayError::StoreUnavailable(e.to_string())
            }
        })?;

        Ok(Identity::new(id, username))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(row.map(|(id, username, password_hash, created_at)| UserRecord {
            id: UserId::from_uuid(id),
            username,
            password_hash,
            created_at,
        }))
    }

    async fn list(&self) -> Result<Vec<Identity>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, username FROM users ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, username)| Identity::new(UserId::from_uuid(id), username))
            .collect())
    }
}
