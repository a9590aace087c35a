//! Request/response DTOs for the REST endpoints.

pub mod auth_dto;
pub mod message_dto;
pub mod people_dto;

pub use auth_dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest};
pub use message_dto::MessageResponse;
pub use people_dto::PersonResponse;
