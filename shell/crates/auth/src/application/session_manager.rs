//! Auth Session Manager
//!
//! Owns the session state and is the only writer of the token store.
//! Constructed once per page and shared by `Arc`.
//!
//! Two counters keep concurrent operations honest:
//! - the refresh generation lets callers that queued behind an in-flight
//!   refresh reuse its outcome instead of presenting a rotated token again
//! - the session epoch is bumped by logout; a refresh that settles under an
//!   older epoch writes nothing

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::watch;

use crate::application::config::AuthClientConfig;
use crate::application::redirect_intent::RedirectIntentStore;
use crate::application::token_store::TokenStore;
use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    session_state::SessionState,
    user_summary::UserSummary,
};
use crate::domain::gateway::AuthBackend;
use crate::domain::value_object::{access_token, email::Email};
use crate::error::{AuthError, AuthResult};

pub struct SessionManager<B>
where
    B: AuthBackend,
{
    backend: Arc<B>,
    store: Arc<TokenStore>,
    redirect_intent: Arc<RedirectIntentStore>,
    config: Arc<AuthClientConfig>,
    state: watch::Sender<SessionState>,
    epoch: Mutex<u64>,
    refresh_generation: AtomicU64,
    /// Outcome of the last completed refresh; held while one is in flight
    refresh_gate: tokio::sync::Mutex<Option<AuthResult<CredentialBundle>>>,
}

impl<B> SessionManager<B>
where
    B: AuthBackend,
{
    pub fn new(
        backend: Arc<B>,
        store: Arc<TokenStore>,
        redirect_intent: Arc<RedirectIntentStore>,
        config: Arc<AuthClientConfig>,
    ) -> Self {
        Self {
            backend,
            store,
            redirect_intent,
            config,
            state: watch::Sender::new(SessionState::initial()),
            epoch: Mutex::new(0),
            refresh_generation: AtomicU64::new(0),
            refresh_gate: tokio::sync::Mutex::new(None),
        }
    }

    // ========================================================================
    // Read-only views
    // ========================================================================

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    pub fn redirect_intent(&self) -> &RedirectIntentStore {
        &self.redirect_intent
    }

    /// Currently stored credentials
    pub fn credentials(&self) -> Option<CredentialBundle> {
        self.store.load()
    }

    /// Whether the stored access token is still usable; no network, no mutation
    pub fn is_valid(&self) -> bool {
        self.store
            .load()
            .is_some_and(|bundle| self.token_is_live(&bundle))
    }

    fn token_is_live(&self, bundle: &CredentialBundle) -> bool {
        access_token::is_live(bundle.access_token(), Utc::now(), self.config.expiry_leeway)
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Resolve the session from storage
    ///
    /// An expired access token gets exactly one refresh attempt.
    pub async fn initialize(&self) -> SessionState {
        let Some(bundle) = self.store.load() else {
            self.state.send_replace(SessionState::signed_out());
            return self.state();
        };

        let live = self.token_is_live(&bundle);
        if live && !self.config.force_refresh_on_init {
            self.state
                .send_replace(SessionState::authenticated(bundle.user().cloned()));
            return self.state();
        }

        tracing::debug!(access_token_live = live, "Refreshing credentials during initialization");
        if let Err(e) = self.refresh().await {
            tracing::info!(error = %e, "Stored session could not be renewed");
        }
        self.state()
    }

    /// Persist credentials received from another origin
    ///
    /// Call [`initialize`](Self::initialize) afterwards to resolve the session.
    pub fn adopt(&self, bundle: &CredentialBundle) -> AuthResult<()> {
        self.store.save(bundle)?;
        tracing::info!(
            user_id = bundle.user().map(|u| u.id.as_str()).unwrap_or("-"),
            "Adopted handed-off credentials"
        );
        Ok(())
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<CredentialBundle> {
        self.begin_attempt();

        let result: AuthResult<CredentialBundle> = async {
            credentials.validate()?;
            let bundle = self.backend.login(credentials).await?;
            self.store.save(&bundle)?;
            Ok(bundle)
        }
        .await;

        self.settle_attempt("login", result)
    }

    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> AuthResult<CredentialBundle> {
        self.begin_attempt();

        let result: AuthResult<CredentialBundle> = async {
            credentials.validate()?;
            let bundle = self.backend.register(credentials).await?;
            self.store.save(&bundle)?;
            Ok(bundle)
        }
        .await;

        self.settle_attempt("register", result)
    }

    fn begin_attempt(&self) {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    /// A failed attempt never signs the user out
    fn settle_attempt(
        &self,
        operation: &'static str,
        result: AuthResult<CredentialBundle>,
    ) -> AuthResult<CredentialBundle> {
        match &result {
            Ok(bundle) => {
                tracing::info!(
                    operation,
                    user_id = bundle.user().map(|u| u.id.as_str()).unwrap_or("-"),
                    "Signed in"
                );
                self.state
                    .send_replace(SessionState::authenticated(bundle.user().cloned()));
            }
            Err(e) => {
                e.log();
                let message = e.user_message();
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message);
                });
            }
        }
        result
    }

    /// Sign out locally, whatever the server says
    pub async fn logout(&self) {
        self.state.send_modify(|state| state.loading = true);

        let access_token = self
            .store
            .load()
            .map(|bundle| bundle.access_token().to_string());

        // Clearing under the bumped epoch keeps an in-flight refresh from
        // writing the old session back.
        {
            let mut epoch = self.lock_epoch();
            *epoch += 1;
            self.store.clear();
        }

        if let Err(e) = self.backend.logout(access_token.as_deref()).await {
            tracing::warn!(error = %e, "Server logout failed, local session cleared anyway");
        }

        self.redirect_intent.clear();
        self.state.send_replace(SessionState::signed_out());
        tracing::info!("Signed out");
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Exchange the refresh token for a new bundle
    ///
    /// Single flight: callers arriving while a refresh is running wait for
    /// it and receive its outcome.
    pub async fn refresh(&self) -> AuthResult<CredentialBundle> {
        let observed = self.refresh_generation.load(Ordering::Acquire);
        let mut last_outcome = self.refresh_gate.lock().await;

        if self.refresh_generation.load(Ordering::Acquire) != observed {
            if let Some(outcome) = last_outcome.as_ref() {
                tracing::debug!("Joined an in-flight token refresh");
                return outcome.clone();
            }
        }

        let outcome = self.refresh_once().await;
        *last_outcome = Some(outcome.clone());
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn refresh_once(&self) -> AuthResult<CredentialBundle> {
        let epoch = *self.lock_epoch();

        let Some(current) = self.store.load() else {
            tracing::debug!("Refresh requested without stored credentials");
            self.state.send_replace(SessionState::signed_out());
            return Err(AuthError::NoRefreshToken);
        };

        let result = self.backend.refresh(current.refresh_token()).await;

        let guard = self.lock_epoch();
        if *guard != epoch {
            tracing::warn!("Discarding refresh outcome that settled after logout");
            return Err(AuthError::SessionEnded);
        }

        let renewed = result.and_then(|bundle| {
            let bundle = match bundle.user() {
                Some(_) => bundle,
                None => bundle.with_user(current.user().cloned()),
            };
            self.store.save(&bundle)?;
            Ok(bundle)
        });

        match renewed {
            Ok(bundle) => {
                // published under the epoch guard so a logout cannot slip in between
                self.state
                    .send_replace(SessionState::authenticated(bundle.user().cloned()));
                drop(guard);
                tracing::info!("Access token refreshed");
                Ok(bundle)
            }
            Err(e) => {
                self.store.clear();
                let error = AuthError::RefreshFailed(e.user_message());
                self.state.send_replace(SessionState {
                    error: Some(error.user_message()),
                    ..SessionState::signed_out()
                });
                drop(guard);

                tracing::warn!(error = %e, "Token refresh failed, session cleared");
                Err(error)
            }
        }
    }

    // ========================================================================
    // Authenticated requests
    // ========================================================================

    /// Run `request` with the access token, refreshing and retrying once
    /// when the backend rejects it
    pub async fn authorized<T, F, Fut>(&self, request: F) -> AuthResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = AuthResult<T>>,
    {
        let access_token = self
            .store
            .load()
            .map(|bundle| bundle.access_token().to_string())
            .ok_or_else(|| AuthError::Unauthorized("Not signed in".to_string()))?;

        match request(access_token).await {
            Err(e) if e.is_auth_rejected() => {
                tracing::debug!("Access token rejected, refreshing once");
                let renewed = self.refresh().await?;
                request(renewed.access_token().to_string()).await
            }
            other => other,
        }
    }

    pub async fn profile(&self) -> AuthResult<UserSummary> {
        let backend = &self.backend;
        self.authorized(|token| async move { backend.profile(&token).await })
            .await
    }

    /// Update the profile and merge the answer into the stored summary
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AuthResult<UserSummary> {
        let backend = &self.backend;
        let user = self
            .authorized(|token| async move { backend.update_profile(&token, update).await })
            .await?;

        self.set_user(user.clone())?;
        Ok(user)
    }

    pub async fn change_password(&self, change: &PasswordChange) -> AuthResult<()> {
        let backend = &self.backend;
        self.authorized(|token| async move { backend.change_password(&token, change).await })
            .await?;

        tracing::info!("Password changed");
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)?;
        self.backend.request_password_reset(email.as_str()).await?;
        tracing::info!(email_domain = %email.domain(), "Password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        if reset_token.trim().is_empty() {
            return Err(AuthError::Validation("Reset token is required".to_string()));
        }
        self.backend.reset_password(reset_token, new_password).await?;
        tracing::info!("Password reset completed");
        Ok(())
    }

    /// Replace the user summary in storage and in the state
    pub fn set_user(&self, user: UserSummary) -> AuthResult<()> {
        self.store.set_user(Some(&user))?;
        self.state.send_modify(|state| state.user = Some(user));
        Ok(())
    }
}
