//! Service layer: business logic orchestration.
//!
//! [`ChatService`] coordinates the realtime core: it routes messages
//! through the store and the [`crate::domain::ConnectionRegistry`], and
//! broadcasts presence on every membership change.

pub mod chat_service;

pub use chat_service::ChatService;
