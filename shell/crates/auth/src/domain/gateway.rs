//! Gateway Traits
//!
//! Collaborators outside the shell: the auth backend and the browser page.

use url::Url;

use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    user_summary::UserSummary,
};
use crate::error::AuthResult;

/// Auth backend trait
///
/// Errors distinguish a rejected credential/token (`AuthError::Unauthorized`)
/// from other rejections (`AuthError::Rejected`, `AuthError::Validation`) and
/// from transport failures (`AuthError::Network`).
#[trait_variant::make(AuthBackend: Send)]
pub trait LocalAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<CredentialBundle>;

    async fn register(&self, credentials: &RegisterCredentials) -> AuthResult<CredentialBundle>;

    /// Server-side logout; the access token may already be gone
    async fn logout(&self, access_token: Option<&str>) -> AuthResult<()>;

    /// Exchange a refresh token for a new bundle
    async fn refresh(&self, refresh_token: &str) -> AuthResult<CredentialBundle>;

    async fn profile(&self, access_token: &str) -> AuthResult<UserSummary>;

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> AuthResult<UserSummary>;

    async fn change_password(&self, access_token: &str, change: &PasswordChange)
    -> AuthResult<()>;

    /// Start a password reset; succeeds for unknown emails too
    async fn request_password_reset(&self, email: &str) -> AuthResult<()>;

    /// Finish a password reset with the token delivered out of band
    async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()>;
}

/// The browser page the shell runs in
pub trait Page: Send + Sync {
    /// Current `window.location`
    fn location(&self) -> Url;

    /// `history.replaceState`: rewrite the visible URL without navigating
    fn replace_history(&self, url: &Url);

    /// Full-page navigation; ends the page lifecycle
    fn navigate(&self, url: &Url);

    /// Same-origin client-side navigation; may fail
    fn push_route(&self, route: &str) -> AuthResult<()>;

    /// Hard reload of the current URL
    fn reload(&self);
}
