//! Configured Backend
//!
//! The backend selected by `AuthClientConfig::backend`.

use crate::application::config::{AuthClientConfig, BackendKind, MockBackendConfig};
use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    user_summary::UserSummary,
};
use crate::domain::gateway::AuthBackend;
use crate::error::AuthResult;
use crate::infra::http_backend::HttpAuthBackend;
use crate::infra::mock_backend::MockAuthBackend;

pub enum ConfiguredBackend {
    Mock(MockAuthBackend),
    Http(HttpAuthBackend),
}

impl ConfiguredBackend {
    pub fn from_config(config: &AuthClientConfig, mock: MockBackendConfig) -> AuthResult<Self> {
        let backend = match config.backend {
            BackendKind::Mock => Self::Mock(MockAuthBackend::new(mock)?),
            BackendKind::Http => Self::Http(HttpAuthBackend::new(&config.api_url()?)?),
        };
        tracing::info!(backend = ?config.backend, "Auth backend selected");
        Ok(backend)
    }
}

impl AuthBackend for ConfiguredBackend {
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<CredentialBundle> {
        match self {
            Self::Mock(backend) => backend.login(credentials).await,
            Self::Http(backend) => backend.login(credentials).await,
        }
    }

    async fn register(&self, credentials: &RegisterCredentials) -> AuthResult<CredentialBundle> {
        match self {
            Self::Mock(backend) => backend.register(credentials).await,
            Self::Http(backend) => backend.register(credentials).await,
        }
    }

    async fn logout(&self, access_token: Option<&str>) -> AuthResult<()> {
        match self {
            Self::Mock(backend) => backend.logout(access_token).await,
            Self::Http(backend) => backend.logout(access_token).await,
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<CredentialBundle> {
        match self {
            Self::Mock(backend) => backend.refresh(refresh_token).await,
            Self::Http(backend) => backend.refresh(refresh_token).await,
        }
    }

    async fn profile(&self, access_token: &str) -> AuthResult<UserSummary> {
        match self {
            Self::Mock(backend) => backend.profile(access_token).await,
            Self::Http(backend) => backend.profile(access_token).await,
        }
    }

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> AuthResult<UserSummary> {
        match self {
            Self::Mock(backend) => backend.update_profile(access_token, update).await,
            Self::Http(backend) => backend.update_profile(access_token, update).await,
        }
    }

    async fn change_password(&self, access_token: &str, change: &PasswordChange) -> AuthResult<()> {
        match self {
            Self::Mock(backend) => backend.change_password(access_token, change).await,
            Self::Http(backend) => backend.change_password(access_token, change).await,
        }
    }

    async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        match self {
            Self::Mock(backend) => backend.request_password_reset(email).await,
            Self::Http(backend) => backend.request_password_reset(email).await,
        }
    }

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        match self {
            Self::Mock(backend) => backend.reset_password(reset_token, new_password).await,
            Self::Http(backend) => backend.reset_password(reset_token, new_password).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_selects_mock() {
        let config = AuthClientConfig::development();
        let backend =
            ConfiguredBackend::from_config(&config, MockBackendConfig::with_random_secret()).unwrap();
        assert!(matches!(backend, ConfiguredBackend::Mock(_)));
        assert!(backend
            .login(&LoginCredentials::new("user@example.com", "user123"))
            .await
            .is_ok());
    }

    #[test]
    fn test_from_config_selects_http() {
        let config = AuthClientConfig {
            backend: BackendKind::Http,
            ..AuthClientConfig::development()
        };
        let backend = ConfiguredBackend::from_config(&config, MockBackendConfig::default()).unwrap();
        assert!(matches!(backend, ConfiguredBackend::Http(_)));
    }
}
