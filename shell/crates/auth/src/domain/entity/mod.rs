pub mod credential_bundle;
pub mod credentials;
pub mod session_state;
pub mod user_summary;
