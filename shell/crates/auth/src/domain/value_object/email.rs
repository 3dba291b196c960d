//! Email Value Object
//!
//! Represents a validated email address used as the login identifier.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Create a new email with validation
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::validation("Email cannot be empty"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::validation(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::validation("Invalid email format"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        !(domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("   ").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("user@example").is_err());
        assert!(Email::new("user@-example.com").is_err());
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("  Admin@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
        assert_eq!(email.domain(), "example.com");
    }
}
