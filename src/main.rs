//! courier-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints, the WebSocket
//! endpoint, and static serving of uploaded attachments.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courier_gateway::api;
use courier_gateway::app_state::{AppState, WsSettings};
use courier_gateway::auth::JwtIdentityResolver;
use courier_gateway::config::GatewayConfig;
use courier_gateway::domain::ConnectionRegistry;
use courier_gateway::persistence::{
    InMemoryStore, MessageStore, PostgresStore, UploadStore, UserStore,
};
use courier_gateway::service::ChatService;
use courier_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting courier-gateway");

    // Build the store layer
    let (users, messages): (Arc<dyn UserStore>, Arc<dyn MessageStore>) =
        if config.persistence_enabled {
            let store = Arc::new(PostgresStore::connect(&config).await?);
            let users: Arc<dyn UserStore> = store.clone();
            (users, store)
        } else {
            tracing::warn!("persistence disabled; running on the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            (users, store)
        };

    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
    uploads.ensure_dir().await?;

    // Build the realtime core
    let registry = Arc::new(ConnectionRegistry::new());
    let chat = Arc::new(ChatService::new(registry, Arc::clone(&messages)));
    let resolver = Arc::new(JwtIdentityResolver::new(
        &config.jwt_secret,
        config.token_ttl_hours,
    ));

    // Build application state
    let app_state = AppState {
        chat,
        users,
        messages,
        resolver,
        uploads: Arc::clone(&uploads),
        ws: WsSettings {
            ping_interval: config.ping_interval(),
            pong_timeout: config.pong_timeout(),
        },
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .nest_service("/uploads", ServeDir::new(uploads.dir()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.client_url.as_deref())?)
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the CORS layer: a credentialed single-origin policy when
/// `CLIENT_URL` is configured, permissive otherwise.
fn cors_layer(client_url: Option<&str>) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    match client_url {
        Some(origin) => {
            let origin: HeaderValue = origin.parse()?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
        }
        None => Ok(CorsLayer::permissive()),
    }
}
