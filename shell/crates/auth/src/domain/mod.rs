//! Domain Layer
//!
//! Contains entities, value objects, storage traits and gateway traits.

pub mod entity;
pub mod gateway;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    credential_bundle::CredentialBundle, session_state::SessionState, user_summary::UserSummary,
};
pub use gateway::{AuthBackend, Page};
pub use repository::{CookieStorage, LocalStorage};
