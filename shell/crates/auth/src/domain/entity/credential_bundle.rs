//! Credential Bundle Entity
//!
//! Access token + refresh token + optional user summary: the unit of
//! authentication state. A bundle with an empty token cannot be built.

use std::fmt;

use serde::Serialize;

use crate::domain::entity::user_summary::UserSummary;
use crate::error::{AuthError, AuthResult};

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    access_token: String,
    refresh_token: String,
    user: Option<UserSummary>,
}

impl CredentialBundle {
    /// Build a bundle, rejecting empty or whitespace-only tokens
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: Option<UserSummary>,
    ) -> AuthResult<Self> {
        let bundle = Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Construct without validation (for tests of the rejection paths)
    #[cfg(test)]
    pub fn new_unchecked(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: Option<UserSummary>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user,
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::InvalidBundle("access token is empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidBundle("refresh token is empty".to_string()));
        }
        Ok(())
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    pub fn with_user(mut self, user: Option<UserSummary>) -> Self {
        self.user = user;
        self
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &format_args!("[{} bytes]", self.access_token.len()))
            .field("refresh_token", &format_args!("[{} bytes]", self.refresh_token.len()))
            .field("user", &self.user)
            .finish()
    }
}
