//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtIdentityResolver;
use crate::persistence::{MessageStore, UploadStore, UserStore};
use crate::service::ChatService;

/// Timing knobs for the per-connection liveness monitor.
#[derive(Debug, Clone, Copy)]
pub struct WsSettings {
    /// Interval between liveness probes.
    pub ping_interval: Duration,
    /// Window a connection has to answer a probe.
    pub pong_timeout: Duration,
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Realtime core: routing and presence.
    pub chat: Arc<ChatService>,
    /// User account store.
    pub users: Arc<dyn UserStore>,
    /// Durable message log (the same store the router persists into).
    pub messages: Arc<dyn MessageStore>,
    /// Credential token verification and issuance.
    pub resolver: Arc<JwtIdentityResolver>,
    /// File attachment storage.
    pub uploads: Arc<UploadStore>,
    /// Liveness probe timings.
    pub ws: WsSettings,
}
