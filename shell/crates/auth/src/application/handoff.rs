//! Cross-Origin Handoff
//!
//! Carries a credential bundle from the auth app to another origin inside
//! one query parameter of the return URL:
//!
//! `?authToken=<urlencoded {"accessToken","refreshToken","userData"}>`
//!
//! The receiver decodes, persists, then scrubs the parameter from the
//! visible URL.

use platform::location;
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::domain::entity::{credential_bundle::CredentialBundle, user_summary::UserSummary};
use crate::error::{AuthError, AuthResult};

/// Where the login app sends the browser after authenticating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffNavigation {
    /// Cookies are shared; no token in the URL
    SameOrigin(Url),
    /// Return URL with the handoff parameter appended
    CrossOrigin(Url),
}

impl HandoffNavigation {
    pub fn url(&self) -> &Url {
        match self {
            HandoffNavigation::SameOrigin(url) | HandoffNavigation::CrossOrigin(url) => url,
        }
    }

    pub fn carries_credentials(&self) -> bool {
        matches!(self, HandoffNavigation::CrossOrigin(_))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingPayload<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
    user_data: Option<&'a UserSummary>,
}

/// Every field optional; validated after parsing
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingPayload {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct Handoff {
    param: String,
}

impl Handoff {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Plan the post-login navigation to `return_url` from the page at `current`
    pub fn encode(
        &self,
        bundle: &CredentialBundle,
        return_url: &Url,
        current: &Url,
    ) -> AuthResult<HandoffNavigation> {
        bundle.validate()?;

        if location::same_origin(return_url, current) {
            return Ok(HandoffNavigation::SameOrigin(return_url.clone()));
        }

        let payload = OutgoingPayload {
            access_token: bundle.access_token(),
            refresh_token: bundle.refresh_token(),
            user_data: bundle.user(),
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| AuthError::Internal(format!("Failed to encode handoff payload: {}", e)))?;

        // a stale parameter on the return URL must not shadow the new one
        let target = location::without_query_param(return_url, &self.param);
        Ok(HandoffNavigation::CrossOrigin(location::with_query_param(
            &target,
            &self.param,
            &json,
        )))
    }

    pub fn has_token(&self, page_url: &Url) -> bool {
        location::query_param(page_url, &self.param).is_some()
    }

    /// Read the bundle from the page URL; anything malformed reads as `None`
    pub fn decode(&self, page_url: &Url) -> Option<CredentialBundle> {
        let raw = location::query_param(page_url, &self.param)?;

        match self.parse(&raw) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed handoff parameter");
                None
            }
        }
    }

    fn parse(&self, raw: &str) -> AuthResult<CredentialBundle> {
        let payload: IncomingPayload = match serde_json::from_str(raw) {
            Ok(payload) => payload,
            // senders that percent-encode before appending end up encoded twice
            Err(first) => {
                let decoded = decode_once(raw);
                if decoded == raw {
                    return Err(AuthError::Validation(format!("Handoff payload: {}", first)));
                }
                serde_json::from_str(&decoded)
                    .map_err(|e| AuthError::Validation(format!("Handoff payload: {}", e)))?
            }
        };

        let user = match payload.user_data {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => match serde_json::from_value::<UserSummary>(value) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed user data from handoff");
                    None
                }
            },
        };

        CredentialBundle::new(
            payload.access_token.unwrap_or_default(),
            payload.refresh_token.unwrap_or_default(),
            user,
        )
    }

    /// The page URL without the handoff parameter
    pub fn strip(&self, page_url: &Url) -> Url {
        location::without_query_param(page_url, &self.param)
    }
}

fn decode_once(raw: &str) -> String {
    form_urlencoded::parse(format!("v={}", raw).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
