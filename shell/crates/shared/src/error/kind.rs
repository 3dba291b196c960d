//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum used to decide how a failure is recovered.

use serde::Serialize;

/// Error classification
///
/// Every failure in the shell falls into one of these buckets. The bucket
/// decides how the flow continues:
/// * validation and storage problems are recovered locally ("treat as absent")
/// * network and rejection problems are surfaced to the user
/// * expiry problems end the session
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::from_status(401);
/// assert_eq!(kind, ErrorKind::Unauthorized);
/// assert_eq!(kind.status_code(), 401);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input: credentials, token payloads, URLs
    Validation,
    /// Credentials or token rejected by the backend
    Unauthorized,
    /// Authenticated but not allowed
    Forbidden,
    /// Resource does not exist
    NotFound,
    /// Conflicts with existing state (e.g. email already registered)
    Conflict,
    /// Session can no longer continue (dead refresh token, logged out)
    Expired,
    /// Backend unreachable or returned a server error
    Network,
    /// Persisted data unreadable or unwritable
    Storage,
    /// Browser navigation could not be performed
    Navigation,
    /// Invariant violation or unexpected failure
    Internal,
}

impl ErrorKind {
    /// HTTP status code used when the error crosses an HTTP boundary
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized | ErrorKind::Expired => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Network => 503,
            ErrorKind::Storage | ErrorKind::Navigation | ErrorKind::Internal => 500,
        }
    }

    /// Classify an HTTP status returned by a backend
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            408 | 429 | 502..=504 => ErrorKind::Network,
            s if s >= 500 => ErrorKind::Network,
            _ => ErrorKind::Internal,
        }
    }

    /// Human readable label
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Expired => "Expired",
            ErrorKind::Network => "Network",
            ErrorKind::Storage => "Storage",
            ErrorKind::Navigation => "Navigation",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Whether the flow treats the failure as "absent" and continues
    #[inline]
    pub const fn is_recovered_locally(&self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::Storage)
    }

    /// Whether the failure means the session cannot continue
    #[inline]
    pub const fn ends_session(&self) -> bool {
        matches!(self, ErrorKind::Expired)
    }

    /// 5xx equivalents
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::Unauthorized.status_code(), 401);
        assert_eq!(ErrorKind::Expired.status_code(), 401);
        assert_eq!(ErrorKind::Conflict.status_code(), 409);
        assert_eq!(ErrorKind::Network.status_code(), 503);
        assert_eq!(ErrorKind::Storage.status_code(), 500);
    }

    #[test]
    fn test_from_status() {
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Network);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Network);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Internal);
    }

    #[test]
    fn test_recovery_classes() {
        assert!(ErrorKind::Validation.is_recovered_locally());
        assert!(ErrorKind::Storage.is_recovered_locally());
        assert!(!ErrorKind::Network.is_recovered_locally());
        assert!(ErrorKind::Expired.ends_session());
        assert!(!ErrorKind::Unauthorized.ends_session());
    }
}
