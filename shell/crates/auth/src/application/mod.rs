//! Application Layer
//!
//! Client-side services: storage, session, handoff and page flows.

pub mod bootstrap;
pub mod config;
pub mod guard;
pub mod handoff;
pub mod login_flow;
pub mod redirect_intent;
pub mod session_manager;
pub mod token_store;

// Re-exports
pub use bootstrap::{BootstrapController, BootstrapOutcome, BootstrapState};
pub use config::{AuthClientConfig, BackendKind, MockBackendConfig, StorageMode};
pub use guard::{GuardDecision, GuardPolicy, RouteGuard};
pub use handoff::{Handoff, HandoffNavigation};
pub use login_flow::{LoginFlow, LoginNavigation};
pub use redirect_intent::RedirectIntentStore;
pub use session_manager::SessionManager;
pub use token_store::TokenStore;
