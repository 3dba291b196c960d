//! Session State Entity

use crate::domain::entity::user_summary::UserSummary;

/// What the UI renders from; published by the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<UserSummary>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// State on mount, before storage was consulted
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: true,
            error: None,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::initial()
        }
    }

    pub fn authenticated(user: Option<UserSummary>) -> Self {
        Self {
            is_authenticated: true,
            user,
            loading: false,
            error: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
