//! Bootstrap Controller
//!
//! Page-load state machine of a protected application:
//!
//! ```text
//! INIT -> CHECKING_URL_TOKEN -> (CONSUMING_TOKEN | CHECKING_SESSION)
//!      -> (AUTHENTICATED | REDIRECTING_TO_LOGIN)
//! ```
//!
//! One controller per page load. The state plus `token_consumed` are the
//! only loop guards.

use std::sync::Arc;

use derive_more::Display;
use platform::location;
use tokio_util::sync::CancellationToken;
use url::{Position, Url};

use crate::application::handoff::Handoff;
use crate::application::session_manager::SessionManager;
use crate::domain::entity::{session_state::SessionState, user_summary::UserSummary};
use crate::domain::gateway::{AuthBackend, Page};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BootstrapState {
    #[display("INIT")]
    Init,
    #[display("CHECKING_URL_TOKEN")]
    CheckingUrlToken,
    #[display("CONSUMING_TOKEN")]
    ConsumingToken,
    #[display("CHECKING_SESSION")]
    CheckingSession,
    #[display("AUTHENTICATED")]
    Authenticated,
    #[display("REDIRECTING_TO_LOGIN")]
    RedirectingToLogin,
}

impl BootstrapState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BootstrapState::Authenticated | BootstrapState::RedirectingToLogin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Render protected content
    Authenticated {
        user: Option<UserSummary>,
        via_handoff: bool,
    },
    /// The page navigated to the auth app
    RedirectedToLogin { login_url: Url },
    /// The page was torn down before the session resolved; nothing happened
    Unmounted,
}

pub struct BootstrapController<B>
where
    B: AuthBackend,
{
    session: Arc<SessionManager<B>>,
    page: Arc<dyn Page>,
    handoff: Handoff,
    state: BootstrapState,
    token_consumed: bool,
    outcome: Option<AuthResult<BootstrapOutcome>>,
    unmounted: CancellationToken,
}

impl<B> BootstrapController<B>
where
    B: AuthBackend,
{
    pub fn new(session: Arc<SessionManager<B>>, page: Arc<dyn Page>) -> Self {
        let handoff = Handoff::new(session.config().handoff_param.clone());
        Self {
            session,
            page,
            handoff,
            state: BootstrapState::Init,
            token_consumed: false,
            outcome: None,
            unmounted: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn token_consumed(&self) -> bool {
        self.token_consumed
    }

    /// Cancel to signal the page was unmounted
    pub fn unmount_token(&self) -> CancellationToken {
        self.unmounted.clone()
    }

    /// Drive the machine to a terminal state
    ///
    /// Runs once; later calls return the recorded outcome without touching
    /// the page.
    pub async fn mount(&mut self) -> AuthResult<BootstrapOutcome> {
        if let Some(outcome) = &self.outcome {
            tracing::debug!(state = %self.state, "Bootstrap already ran");
            return outcome.clone();
        }

        let outcome = self.run().await;
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn transition(&mut self, to: BootstrapState) {
        tracing::debug!(from = %self.state, to = %to, "Bootstrap transition");
        self.state = to;
    }

    async fn run(&mut self) -> AuthResult<BootstrapOutcome> {
        self.transition(BootstrapState::CheckingUrlToken);
        let page_url = self.page.location();

        let adopted = if self.handoff.has_token(&page_url) {
            self.transition(BootstrapState::ConsumingToken);
            self.consume_token(&page_url).await
        } else {
            None
        };

        let session_state = match adopted {
            Some(state) => state,
            None => {
                self.transition(BootstrapState::CheckingSession);
                let session = Arc::clone(&self.session);
                tokio::select! {
                    _ = self.unmounted.cancelled() => {
                        tracing::debug!("Unmounted during session check");
                        return Ok(BootstrapOutcome::Unmounted);
                    }
                    state = session.initialize() => state,
                }
            }
        };

        if self.unmounted.is_cancelled() {
            tracing::debug!(state = %self.state, "Unmounted before settling");
            return Ok(BootstrapOutcome::Unmounted);
        }

        if session_state.is_authenticated {
            self.transition(BootstrapState::Authenticated);
            self.land();
            return Ok(BootstrapOutcome::Authenticated {
                user: session_state.user,
                via_handoff: self.token_consumed,
            });
        }

        self.redirect_to_login(&page_url)
    }

    /// Decode and save the bundle, scrub the URL, then resolve the session
    async fn consume_token(&mut self, page_url: &Url) -> Option<SessionState> {
        let adopted = self
            .handoff
            .decode(page_url)
            .map(|bundle| self.session.adopt(&bundle));

        // the parameter leaves the visible URL whatever it contained, and
        // before any network call
        self.page.replace_history(&self.handoff.strip(page_url));

        match adopted? {
            Ok(()) => {
                self.token_consumed = true;
                let state = self.session.initialize().await;
                tracing::info!(authenticated = state.is_authenticated, "Handoff token consumed");
                Some(state)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Handed-off credentials could not be stored");
                None
            }
        }
    }

    /// Soft-navigate to the pending intent, or to the protected route after
    /// a handoff; hard reload only when the router refuses
    fn land(&self) {
        let current = self.page.location();
        let intent = self
            .session
            .redirect_intent()
            .take()
            .filter(|url| location::same_origin(url, &current))
            .map(|url| url[Position::BeforePath..].to_string());

        let target = match intent {
            Some(path) => path,
            None if self.token_consumed => self.session.config().protected_route.clone(),
            None => return,
        };

        if current[Position::BeforePath..] == *target {
            return;
        }

        if let Err(e) = self.page.push_route(&target) {
            tracing::warn!(error = %e, route = %target, "Soft navigation failed, reloading");
            self.page.reload();
        }
    }

    fn redirect_to_login(&mut self, page_url: &Url) -> AuthResult<BootstrapOutcome> {
        if self.token_consumed {
            let error = AuthError::RedirectLoop(
                "credentials consumed on this page load did not yield a session".to_string(),
            );
            error.log();
            return Err(error);
        }

        self.transition(BootstrapState::RedirectingToLogin);

        let config = self.session.config();
        let protected = location::join_route(page_url, &config.protected_route)?;
        if let Err(e) = self.session.redirect_intent().set(&protected) {
            tracing::warn!(error = %e, "Could not record redirect intent");
        }

        let login_url = location::join_route(&config.auth_app_url()?, &config.login_route)?;
        let login_url =
            location::with_query_param(&login_url, &config.return_url_param, protected.as_str());

        tracing::info!(login_url = %login_url, "Redirecting to login");
        self.page.navigate(&login_url);

        Ok(BootstrapOutcome::RedirectedToLogin { login_url })
    }
}
