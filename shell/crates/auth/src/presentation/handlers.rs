//! HTTP Handlers
//!
//! Serve any `AuthBackend` over the REST surface the HTTP client speaks.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use std::sync::Arc;

use crate::domain::entity::user_summary::UserSummary;
use crate::domain::gateway::AuthBackend;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, PasswordResetRequest,
    ProfileUpdateRequest, RefreshRequest, RegisterRequest, ResetPasswordRequest,
};

/// Shared state for auth handlers
pub struct AuthAppState<B> {
    pub backend: Arc<B>,
}

impl<B> Clone for AuthAppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

// ============================================================================
// Login / Register / Logout
// ============================================================================

/// POST /api/auth/login
pub async fn login<B>(
    State(state): State<AuthAppState<B>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    B: AuthBackend + Sync + 'static,
{
    let bundle = state.backend.login(&req.into()).await?;
    Ok(Json(bundle.into()))
}

/// POST /api/auth/register
pub async fn register<B>(
    State(state): State<AuthAppState<B>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)>
where
    B: AuthBackend + Sync + 'static,
{
    let bundle = state.backend.register(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(bundle.into())))
}

/// POST /api/auth/logout
pub async fn logout<B>(State(state): State<AuthAppState<B>>, headers: HeaderMap) -> StatusCode
where
    B: AuthBackend + Sync + 'static,
{
    // Always succeeds - the client clears its storage regardless
    if let Err(e) = state.backend.logout(bearer_token(&headers)).await {
        tracing::warn!(error = %e, "Logout failed on the backend");
    }
    StatusCode::NO_CONTENT
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh-token
pub async fn refresh_token<B>(
    State(state): State<AuthAppState<B>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    B: AuthBackend + Sync + 'static,
{
    if req.refresh_token.trim().is_empty() {
        return Err(AuthError::Validation("Refresh token is required".to_string()));
    }
    let bundle = state.backend.refresh(&req.refresh_token).await?;
    Ok(Json(bundle.into()))
}

// ============================================================================
// Profile (requires a bearer token)
// ============================================================================

/// GET /api/auth/profile
pub async fn profile<B>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
) -> AuthResult<Json<UserSummary>>
where
    B: AuthBackend + Sync + 'static,
{
    let token = require_bearer(&headers)?;
    Ok(Json(state.backend.profile(token).await?))
}

/// PUT /api/auth/profile
pub async fn update_profile<B>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
    Json(req): Json<ProfileUpdateRequest>,
) -> AuthResult<Json<UserSummary>>
where
    B: AuthBackend + Sync + 'static,
{
    let token = require_bearer(&headers)?;
    Ok(Json(state.backend.update_profile(token, &req.into()).await?))
}

/// POST /api/auth/change-password
pub async fn change_password<B>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<StatusCode>
where
    B: AuthBackend + Sync + 'static,
{
    let token = require_bearer(&headers)?;
    state.backend.change_password(token, &req.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/request-password-reset
pub async fn request_password_reset<B>(
    State(state): State<AuthAppState<B>>,
    Json(req): Json<PasswordResetRequest>,
) -> AuthResult<StatusCode>
where
    B: AuthBackend + Sync + 'static,
{
    state.backend.request_password_reset(&req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/reset-password
pub async fn reset_password<B>(
    State(state): State<AuthAppState<B>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode>
where
    B: AuthBackend + Sync + 'static,
{
    state.backend.reset_password(&req.token, &req.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Token of an `Authorization: Bearer ...` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn require_bearer(headers: &HeaderMap) -> AuthResult<&str> {
    bearer_token(headers).ok_or_else(|| AuthError::Unauthorized("Missing bearer token".to_string()))
}
