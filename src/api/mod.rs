//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Endpoints are mounted at the root level for wire compatibility with
//! the existing browser client.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::logout_handler,
        handlers::auth::profile_handler,
        handlers::people::people_handler,
        handlers::messages::messages_handler,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::RegisterRequest,
        dto::LoginRequest,
        dto::AuthResponse,
        dto::ProfileResponse,
        dto::PersonResponse,
        dto::MessageResponse,
        handlers::system::HealthResponse,
    ))
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", <ApiDoc as OpenApi>::openapi()),
    );

    router
}
