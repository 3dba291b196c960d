//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! `AuthError` is `Clone` because one refresh outcome is handed to every
//! caller that joined the same in-flight refresh.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::location::LocationError;
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Access or refresh token missing/empty
    #[error("Invalid credential bundle: {0}")]
    InvalidBundle(String),

    /// Malformed input (credentials, payloads, profile fields)
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the presented credentials or token (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Any other non-2xx answer from the backend
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Nothing to refresh with
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The refresh token is dead; the session cannot continue
    #[error("Session expired: {0}")]
    RefreshFailed(String),

    /// A logout happened while the operation was in flight
    #[error("Session ended while the request was in flight")]
    SessionEnded,

    /// `returnUrl` is not an acceptable navigation target
    #[error("Invalid return URL: {0}")]
    InvalidReturnUrl(String),

    /// Refusing to bounce back to the login app during the same page load
    #[error("Redirect loop prevented: {0}")]
    RedirectLoop(String),

    /// Backend unreachable or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Browser storage refused a write
    #[error("Storage error: {0}")]
    Storage(String),

    /// The page could not be navigated
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidBundle(_)
            | AuthError::Validation(_)
            | AuthError::InvalidReturnUrl(_) => ErrorKind::Validation,
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::Rejected { status, .. } => ErrorKind::from_status(*status),
            AuthError::NoRefreshToken | AuthError::RefreshFailed(_) | AuthError::SessionEnded => {
                ErrorKind::Expired
            }
            AuthError::Network(_) => ErrorKind::Network,
            AuthError::Storage(_) => ErrorKind::Storage,
            AuthError::Navigation(_) | AuthError::RedirectLoop(_) => ErrorKind::Navigation,
            AuthError::Config(_) | AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an authentication-rejected answer that a refresh may cure
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, AuthError::Unauthorized(_))
    }

    /// Message suitable for `SessionState::error`
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Network(_) => "Unable to reach the authentication service".to_string(),
            AuthError::Storage(_) => "Unable to store your session in this browser".to_string(),
            AuthError::Config(_) | AuthError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.user_message());
        match self.kind() {
            ErrorKind::Expired => error.with_action("Sign in again"),
            ErrorKind::Network => error.with_action("Check your connection and try again"),
            _ => error,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Config(msg) | AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::RedirectLoop(msg) => {
                tracing::error!(message = %msg, "Auth redirect loop prevented");
            }
            AuthError::Unauthorized(_) => {
                tracing::warn!("Authentication rejected");
            }
            AuthError::Network(msg) => {
                tracing::warn!(message = %msg, "Auth backend unreachable");
            }
            AuthError::Storage(msg) => {
                tracing::warn!(message = %msg, "Auth storage write failed");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::Validation => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<LocationError> for AuthError {
    fn from(err: LocationError) -> Self {
        AuthError::InvalidReturnUrl(err.to_string())
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AuthError::Unauthorized("x".into()).kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::NoRefreshToken.kind(), ErrorKind::Expired);
        assert_eq!(AuthError::SessionEnded.kind(), ErrorKind::Expired);
        assert_eq!(
            AuthError::Rejected { status: 409, message: "taken".into() }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AuthError::Rejected { status: 502, message: "bad gateway".into() }.kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(AuthError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::Unauthorized("no".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Rejected { status: 409, message: "taken".into() }.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AuthError::Internal("mutex poisoned at session.rs".into());
        assert_eq!(err.user_message(), "Something went wrong");

        let err = AuthError::Unauthorized("Invalid email or password".into());
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn test_only_unauthorized_triggers_refresh() {
        assert!(AuthError::Unauthorized("expired".into()).is_auth_rejected());
        assert!(!AuthError::Rejected { status: 403, message: "no".into() }.is_auth_rejected());
        assert!(!AuthError::Network("down".into()).is_auth_rejected());
    }

    #[test]
    fn test_expired_carries_action() {
        let app = AuthError::RefreshFailed("revoked".into()).to_app_error();
        assert_eq!(app.kind(), ErrorKind::Expired);
        assert_eq!(app.action(), Some("Sign in again"));
    }
}
