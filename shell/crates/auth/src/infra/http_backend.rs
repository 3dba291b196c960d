//! HTTP Auth Backend
//!
//! Talks to a real auth server over `/api/auth/*` with reqwest.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    user_summary::UserSummary,
};
use crate::domain::gateway::AuthBackend;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, ChangePasswordRequest, ErrorResponse, LoginRequest, PasswordResetRequest,
    ProfileUpdateRequest, RefreshRequest, RegisterRequest, ResetPasswordRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    base_url: String,
    http: Client,
}

impl HttpAuthBackend {
    pub fn new(api_url: &Url) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: api_url.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/auth/{}", self.base_url, path)
    }

    /// Send and map a non-2xx answer into the error taxonomy
    async fn send(&self, request: RequestBuilder, fallback: &'static str) -> AuthResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Auth request failed in transport");
            AuthError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorResponse = response.json().await.unwrap_or_default();
        let message = body.message.unwrap_or_else(|| fallback.to_string());
        tracing::debug!(status = status.as_u16(), %message, "Auth request rejected");

        Err(match status {
            StatusCode::UNAUTHORIZED => AuthError::Unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AuthError::Validation(message)
            }
            _ => AuthError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::Validation(format!("Invalid auth response payload: {}", e)))
    }

    async fn bundle(&self, request: RequestBuilder, fallback: &'static str) -> AuthResult<CredentialBundle> {
        let response = self.send(request, fallback).await?;
        Self::read_json::<AuthResponse>(response).await?.into_bundle()
    }
}

impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<CredentialBundle> {
        let request = self
            .http
            .post(self.endpoint("login"))
            .json(&LoginRequest::from(credentials));
        self.bundle(request, "Login failed").await
    }

    async fn register(&self, credentials: &RegisterCredentials) -> AuthResult<CredentialBundle> {
        let request = self
            .http
            .post(self.endpoint("register"))
            .json(&RegisterRequest::from(credentials));
        self.bundle(request, "Registration failed").await
    }

    async fn logout(&self, access_token: Option<&str>) -> AuthResult<()> {
        let mut request = self.http.post(self.endpoint("logout"));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        self.send(request, "Logout failed").await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<CredentialBundle> {
        let request = self
            .http
            .post(self.endpoint("refresh-token"))
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            });
        self.bundle(request, "Token refresh failed").await
    }

    async fn profile(&self, access_token: &str) -> AuthResult<UserSummary> {
        let request = self.http.get(self.endpoint("profile")).bearer_auth(access_token);
        let response = self.send(request, "Failed to get user profile").await?;
        Self::read_json(response).await
    }

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> AuthResult<UserSummary> {
        let request = self
            .http
            .put(self.endpoint("profile"))
            .bearer_auth(access_token)
            .json(&ProfileUpdateRequest::from(update));
        let response = self.send(request, "Failed to update user profile").await?;
        Self::read_json(response).await
    }

    async fn change_password(&self, access_token: &str, change: &PasswordChange) -> AuthResult<()> {
        let request = self
            .http
            .post(self.endpoint("change-password"))
            .bearer_auth(access_token)
            .json(&ChangePasswordRequest::from(change));
        self.send(request, "Failed to change password").await?;
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        let request = self
            .http
            .post(self.endpoint("request-password-reset"))
            .json(&PasswordResetRequest {
                email: email.to_string(),
            });
        self.send(request, "Failed to request password reset").await?;
        Ok(())
    }

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        let request = self
            .http
            .post(self.endpoint("reset-password"))
            .json(&ResetPasswordRequest {
                token: reset_token.to_string(),
                new_password: new_password.to_string(),
            });
        self.send(request, "Failed to reset password").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let backend = HttpAuthBackend::new(&Url::parse("http://localhost:3001/").unwrap()).unwrap();
        assert_eq!(backend.endpoint("login"), "http://localhost:3001/api/auth/login");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // port 9 (discard) is closed on test machines
        let backend = HttpAuthBackend::new(&Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = backend
            .login(&LoginCredentials::new("user@example.com", "user123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
    }
}
