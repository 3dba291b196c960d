//! Application Error - User-facing error type
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// User-facing error
///
/// What the UI layer shows when an operation fails: a classification, a
/// message that is safe to display, and optionally a suggested action.
/// The original error is kept as `source` for logs only.
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Unauthorized, "Invalid email or password")
///     .with_action("Check your credentials and try again");
/// assert_eq!(err.status_code(), 401);
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// `Result<T, AppError>`
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            source: None,
        }
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    #[inline]
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[inline]
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    #[inline]
    pub fn expired(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    #[inline]
    pub fn network(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    #[inline]
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Suggest what the user should do next
    #[inline]
    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attach the underlying error (never displayed to the user)
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(action) = &self.action {
            builder.field("action", action);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " (Action: {})", action)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

// ============================================================================
// Result extension traits
// ============================================================================

/// Wraps foreign errors into [`AppError`] with a chosen classification
pub trait ResultExt<T, E> {
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_app_err(self, kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static,
    {
        self.map_err(|e| AppError::new(kind, message).with_source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::Unauthorized, "Invalid credentials");
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.message(), "Invalid credentials");
        assert!(err.action().is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(AppError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(AppError::conflict("x").status_code(), 409);
        assert_eq!(AppError::expired("x").kind(), ErrorKind::Expired);
        assert_eq!(AppError::network("x").status_code(), 503);
        assert_eq!(AppError::storage("x").kind(), ErrorKind::Storage);
        assert_eq!(AppError::internal("x").status_code(), 500);
    }

    #[test]
    fn test_with_action_and_display() {
        let err = AppError::expired("Session expired").with_action("Sign in again");
        assert_eq!(err.action(), Some("Sign in again"));
        assert_eq!(err.to_string(), "[Expired] Session expired (Action: Sign in again)");
    }

    #[test]
    fn test_with_source() {
        let io_err = std::io::Error::other("disk full");
        let err = AppError::storage("Failed to persist").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_result_ext() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::other("boom"));
        let err = result
            .map_app_err(ErrorKind::Storage, "Storage unavailable")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
