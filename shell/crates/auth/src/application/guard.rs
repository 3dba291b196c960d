//! Route Guard
//!
//! Pure decision of what a route renders for a given session state.

use crate::domain::entity::session_state::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardPolicy {
    /// Protected route; unauthenticated users go to this app's login route
    RequireAuth { login_route: String },
    /// Protected route; unauthenticated users go to another app's login page
    RequireAuthCrossApp {
        auth_app_url: String,
        login_route: String,
    },
    /// Login/register pages; authenticated users are sent on
    PublicOnly { redirect_to: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    Render,
    /// Same-app route change
    Redirect(String),
    /// Full navigation to another app
    NavigateExternal(String),
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn decide(state: &SessionState, policy: &GuardPolicy) -> GuardDecision {
        if state.loading {
            return GuardDecision::ShowLoading;
        }

        match policy {
            GuardPolicy::RequireAuth { login_route } => {
                if state.is_authenticated {
                    GuardDecision::Render
                } else {
                    GuardDecision::Redirect(login_route.clone())
                }
            }
            GuardPolicy::RequireAuthCrossApp {
                auth_app_url,
                login_route,
            } => {
                if state.is_authenticated {
                    GuardDecision::Render
                } else {
                    GuardDecision::NavigateExternal(format!(
                        "{}{}",
                        auth_app_url.trim_end_matches('/'),
                        login_route
                    ))
                }
            }
            GuardPolicy::PublicOnly { redirect_to } => {
                if state.is_authenticated {
                    GuardDecision::Redirect(redirect_to.clone())
                } else {
                    GuardDecision::Render
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn require_auth() -> GuardPolicy {
        GuardPolicy::RequireAuth {
            login_route: "/login".to_string(),
        }
    }

    #[test]
    fn test_loading_shows_spinner_for_every_policy() {
        let state = SessionState::initial();
        assert_eq!(RouteGuard::decide(&state, &require_auth()), GuardDecision::ShowLoading);
        assert_eq!(
            RouteGuard::decide(&state, &GuardPolicy::PublicOnly { redirect_to: "/dashboard".into() }),
            GuardDecision::ShowLoading
        );
    }

    #[test]
    fn test_require_auth() {
        assert_eq!(
            RouteGuard::decide(&SessionState::signed_out(), &require_auth()),
            GuardDecision::Redirect("/login".into())
        );
        assert_eq!(
            RouteGuard::decide(&SessionState::authenticated(None), &require_auth()),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_require_auth_cross_app() {
        let policy = GuardPolicy::RequireAuthCrossApp {
            auth_app_url: "http://localhost:3000/".to_string(),
            login_route: "/login".to_string(),
        };
        assert_eq!(
            RouteGuard::decide(&SessionState::signed_out(), &policy),
            GuardDecision::NavigateExternal("http://localhost:3000/login".into())
        );
    }

    #[test]
    fn test_public_only() {
        let policy = GuardPolicy::PublicOnly {
            redirect_to: "/dashboard".to_string(),
        };
        assert_eq!(
            RouteGuard::decide(&SessionState::authenticated(None), &policy),
            GuardDecision::Redirect("/dashboard".into())
        );
        assert_eq!(RouteGuard::decide(&SessionState::signed_out(), &policy), GuardDecision::Render);
    }
}
