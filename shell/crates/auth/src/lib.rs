//! Auth Shell Module
//!
//! Client-side authentication shell shared by micro-frontend applications.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, storage and gateway traits
//! - `application/` - Token store, session manager, bootstrap and login flows
//! - `infra/` - Mock and HTTP backends, simulated browser
//! - `presentation/` - HTTP handlers, DTOs, router of the mock API
//!
//! ## Features
//! - Credential bundle persisted in scoped cookies (or one local record)
//! - Single-flight token refresh; logout wins over an in-flight refresh
//! - Cross-origin handoff of credentials through a URL parameter
//! - Bootstrap state machine for applications that do not own login
//!
//! ## Security Model
//! - Handoff payloads are removed from the address bar before anything else
//! - Return URLs must be absolute http(s), optionally from trusted origins
//! - A receiving application never bounces back to login in the same page load

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{AuthClientConfig, MockBackendConfig};
pub use application::{BootstrapController, LoginFlow, SessionManager, TokenStore};
pub use error::{AuthError, AuthResult};
pub use infra::{ConfiguredBackend, HttpAuthBackend, MockAuthBackend};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
