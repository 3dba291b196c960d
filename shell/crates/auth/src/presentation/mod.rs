//! Presentation Layer
//!
//! HTTP handlers, DTOs and router of the mock auth API.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::AuthAppState;
pub use router::auth_router;
