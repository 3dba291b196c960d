//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::domain::gateway::AuthBackend;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router for any backend; nest it under `/api/auth`
pub fn auth_router<B>(backend: Arc<B>) -> Router
where
    B: AuthBackend + Sync + 'static,
{
    let state = AuthAppState { backend };

    Router::new()
        .route("/login", post(handlers::login::<B>))
        .route("/register", post(handlers::register::<B>))
        .route("/logout", post(handlers::logout::<B>))
        .route("/refresh-token", post(handlers::refresh_token::<B>))
        .route(
            "/profile",
            get(handlers::profile::<B>).put(handlers::update_profile::<B>),
        )
        .route("/change-password", post(handlers::change_password::<B>))
        .route(
            "/request-password-reset",
            post(handlers::request_password_reset::<B>),
        )
        .route("/reset-password", post(handlers::reset_password::<B>))
        .with_state(state)
}
