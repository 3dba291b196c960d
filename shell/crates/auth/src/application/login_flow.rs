//! Login Flow
//!
//! Sender side of the handoff, running on the auth app's login page. Reads
//! `returnUrl`, signs the user in and sends the browser back, with the
//! credentials in the URL when the return origin differs.

use std::sync::Arc;

use platform::location;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::application::config::AuthClientConfig;
use crate::application::handoff::{Handoff, HandoffNavigation};
use crate::application::session_manager::SessionManager;
use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, RegisterCredentials},
};
use crate::domain::gateway::{AuthBackend, Page};
use crate::error::{AuthError, AuthResult};

/// What the flow did with the page after authenticating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginNavigation {
    /// Full navigation to a return URL on this origin
    SameOrigin(Url),
    /// Full navigation carrying the handoff parameter
    Handoff(Url),
    /// No return URL; client-side push to the default route
    DefaultRoute(String),
    /// The page was torn down first; no navigation
    Abandoned,
}

pub struct LoginFlow<B>
where
    B: AuthBackend,
{
    session: Arc<SessionManager<B>>,
    page: Arc<dyn Page>,
    handoff: Handoff,
    return_url: Option<Url>,
    logout_visit: bool,
    unmounted: CancellationToken,
}

impl<B> LoginFlow<B>
where
    B: AuthBackend,
{
    pub fn new(session: Arc<SessionManager<B>>, page: Arc<dyn Page>) -> Self {
        let config = session.config();
        let page_url = page.location();

        let return_url = location::query_param(&page_url, &config.return_url_param).and_then(
            |raw| match accept_return_url(config, &raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring return URL");
                    None
                }
            },
        );

        if let Some(url) = &return_url {
            if let Err(e) = session.redirect_intent().set(url) {
                tracing::warn!(error = %e, "Could not record redirect intent");
            }
        }

        let logout_visit = location::query_param(&page_url, &config.logout_param)
            .is_some_and(|value| value == "true");

        Self {
            handoff: Handoff::new(config.handoff_param.clone()),
            session,
            page,
            return_url,
            logout_visit,
            unmounted: CancellationToken::new(),
        }
    }

    pub fn return_url(&self) -> Option<&Url> {
        self.return_url.as_ref()
    }

    /// The page was opened right after a logout (`?logout=true`)
    pub fn is_logout_visit(&self) -> bool {
        self.logout_visit
    }

    /// Cancel to signal the page was unmounted
    pub fn unmount_token(&self) -> CancellationToken {
        self.unmounted.clone()
    }

    /// Sign in, then send the browser on
    pub async fn submit(&self, credentials: &LoginCredentials) -> AuthResult<LoginNavigation> {
        let bundle = self.session.login(credentials).await?;
        self.resume(&bundle).await
    }

    /// Register, then send the browser on
    pub async fn submit_registration(
        &self,
        credentials: &RegisterCredentials,
    ) -> AuthResult<LoginNavigation> {
        let bundle = self.session.register(credentials).await?;
        self.resume(&bundle).await
    }

    /// A signed-in user landing on the login page goes straight back,
    /// except right after logging out
    pub async fn resume_existing_session(&self) -> AuthResult<Option<LoginNavigation>> {
        if self.logout_visit {
            tracing::debug!("Logout visit, staying on the login page");
            return Ok(None);
        }

        if !self.session.initialize().await.is_authenticated {
            return Ok(None);
        }
        let Some(bundle) = self.session.credentials() else {
            return Ok(None);
        };

        self.resume(&bundle).await.map(Some)
    }

    /// Navigate to the pending return target with `bundle`
    pub async fn resume(&self, bundle: &CredentialBundle) -> AuthResult<LoginNavigation> {
        let config = self.session.config();
        let target = self
            .session
            .redirect_intent()
            .take()
            .or_else(|| self.return_url.clone());

        let Some(target) = target else {
            return self.push_default_route(config);
        };

        if !config.is_trusted_return(&target) {
            return Err(AuthError::InvalidReturnUrl(format!(
                "{} is not a trusted origin",
                location::origin_of(&target)
            )));
        }

        match self.handoff.encode(bundle, &target, &self.page.location())? {
            HandoffNavigation::SameOrigin(url) => {
                if self.unmounted.is_cancelled() {
                    return Ok(LoginNavigation::Abandoned);
                }
                tracing::info!(target = %url, "Returning to same-origin page");
                self.page.navigate(&url);
                Ok(LoginNavigation::SameOrigin(url))
            }
            HandoffNavigation::CrossOrigin(url) => {
                tracing::info!(
                    target_origin = %location::origin_of(&url),
                    "Handing credentials off"
                );

                // storage writes must commit before the page unloads
                tokio::select! {
                    _ = self.unmounted.cancelled() => {
                        tracing::debug!("Unmounted before handoff navigation");
                        return Ok(LoginNavigation::Abandoned);
                    }
                    _ = tokio::time::sleep(config.handoff_commit_delay) => {}
                }

                self.page.navigate(&url);
                Ok(LoginNavigation::Handoff(url))
            }
        }
    }

    fn push_default_route(&self, config: &AuthClientConfig) -> AuthResult<LoginNavigation> {
        if self.unmounted.is_cancelled() {
            return Ok(LoginNavigation::Abandoned);
        }

        let route = config.post_login_route.clone();
        if let Err(e) = self.page.push_route(&route) {
            tracing::warn!(error = %e, route = %route, "Soft navigation failed, navigating");
            let url = location::join_route(&self.page.location(), &route)?;
            self.page.navigate(&url);
        }
        Ok(LoginNavigation::DefaultRoute(route))
    }
}

fn accept_return_url(config: &AuthClientConfig, raw: &str) -> AuthResult<Url> {
    let url = location::parse_absolute(raw)?;

    if !config.is_trusted_return(&url) {
        return Err(AuthError::InvalidReturnUrl(format!(
            "{} is not a trusted origin",
            location::origin_of(&url)
        )));
    }
    if config.trusted_return_origins.is_empty() {
        tracing::debug!(
            target_origin = %location::origin_of(&url),
            "Return URL accepted without an origin allow-list"
        );
    }

    Ok(url)
}
