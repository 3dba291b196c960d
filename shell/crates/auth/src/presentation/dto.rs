//! API DTOs (Data Transfer Objects)
//!
//! Wire shapes of `/api/auth/*`, shared by the mock server and the HTTP
//! client. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    user_summary::UserSummary,
};
use crate::error::AuthResult;

// ============================================================================
// Login / Register
// ============================================================================

/// Login request
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<&LoginCredentials> for LoginRequest {
    fn from(credentials: &LoginCredentials) -> Self {
        Self {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        }
    }
}

impl From<LoginRequest> for LoginCredentials {
    fn from(req: LoginRequest) -> Self {
        LoginCredentials::new(req.email, req.password)
    }
}

/// Register request
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<&RegisterCredentials> for RegisterRequest {
    fn from(credentials: &RegisterCredentials) -> Self {
        Self {
            name: credentials.name.clone(),
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        }
    }
}

impl From<RegisterRequest> for RegisterCredentials {
    fn from(req: RegisterRequest) -> Self {
        RegisterCredentials::new(req.name, req.email, req.password)
    }
}

/// Login, register and refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl AuthResponse {
    /// Validate into a bundle; an empty token is rejected
    pub fn into_bundle(self) -> AuthResult<CredentialBundle> {
        CredentialBundle::new(self.access_token, self.refresh_token, self.user)
    }
}

impl From<CredentialBundle> for AuthResponse {
    fn from(bundle: CredentialBundle) -> Self {
        Self {
            access_token: bundle.access_token().to_string(),
            refresh_token: bundle.refresh_token().to_string(),
            user: bundle.user().cloned(),
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Profile
// ============================================================================

/// Profile update request; absent fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&ProfileUpdate> for ProfileUpdateRequest {
    fn from(update: &ProfileUpdate) -> Self {
        Self {
            name: update.name.clone(),
            email: update.email.clone(),
        }
    }
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(req: ProfileUpdateRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            email: req.email,
        }
    }
}

/// Change password request
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl From<&PasswordChange> for ChangePasswordRequest {
    fn from(change: &PasswordChange) -> Self {
        Self {
            current_password: change.current_password.clone(),
            new_password: change.new_password.clone(),
        }
    }
}

impl From<ChangePasswordRequest> for PasswordChange {
    fn from(req: ChangePasswordRequest) -> Self {
        PasswordChange::new(req.current_password, req.new_password)
    }
}

// ============================================================================
// Password Reset
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Error body; only `message` is read by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_response_wire_names() {
        let json = r#"{"accessToken":"a","refreshToken":"r","user":{"id":7,"name":"N","email":"n@example.com","role":"admin"}}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let bundle = response.into_bundle().unwrap();
        assert_eq!(bundle.user().unwrap().id, "7");

        let back = serde_json::to_value(AuthResponse::from(bundle)).unwrap();
        assert_eq!(back["accessToken"], "a");
        assert_eq!(back["refreshToken"], "r");
    }

    #[test]
    fn test_auth_response_with_empty_token_is_rejected() {
        let json = r#"{"accessToken":"","refreshToken":"r"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_bundle().is_err());
    }

    #[test]
    fn test_profile_update_omits_absent_fields() {
        let req = ProfileUpdateRequest {
            name: Some("N".to_string()),
            email: None,
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"name":"N"}"#);
    }
}
