//! Credentials Entities
//!
//! Inputs of the backend operations. Passwords are redacted from `Debug`.

use std::fmt;

use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Client-side shape check before contacting the backend
    pub fn validate(&self) -> AuthResult<Email> {
        let email = Email::new(self.email.as_str())?;
        if self.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        Ok(email)
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterCredentials {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> AuthResult<Email> {
        if self.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        let email = Email::new(self.email.as_str())?;
        if self.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        Ok(email)
    }
}

impl fmt::Debug for RegisterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Fields a user may change on their profile; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub fn new(current_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
        }
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_validation() {
        assert!(LoginCredentials::new("user@example.com", "user123").validate().is_ok());
        assert!(matches!(
            LoginCredentials::new("not-an-email", "user123").validate(),
            Err(AuthError::Validation(_))
        ));
        assert!(LoginCredentials::new("user@example.com", "").validate().is_err());
    }

    #[test]
    fn test_register_requires_name() {
        assert!(RegisterCredentials::new(" ", "a@example.com", "secret1").validate().is_err());
        assert!(RegisterCredentials::new("Ann", "a@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let debug = format!("{:?}", LoginCredentials::new("a@example.com", "hunter22"));
        assert!(!debug.contains("hunter22"));
        let debug = format!("{:?}", PasswordChange::new("old-secret", "new-secret"));
        assert!(!debug.contains("secret"));
    }
}
