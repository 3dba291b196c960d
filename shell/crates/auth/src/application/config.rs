//! Application Configuration
//!
//! Configuration for the auth client and for the mock backend.

use std::time::Duration;

use platform::location;
use url::Url;

use crate::domain::value_object::access_token::DEFAULT_EXPIRY_LEEWAY;
use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Which backend implementation the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-process mock with a fixed user table
    #[default]
    Mock,
    /// REST backend at `api_url`
    Http,
}

/// Where the token store keeps the credential bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Scoped cookies for tokens, local storage for the user summary
    #[default]
    Cookies,
    /// One local storage record, no domain scoping
    LocalOnly,
}

/// Auth client configuration
#[derive(Debug, Clone)]
pub struct AuthClientConfig {
    /// Base URL of the REST backend (`BackendKind::Http`)
    pub api_url: String,
    /// Origin of the auth (login) application
    pub auth_app_url: String,
    /// Login route on the auth application
    pub login_route: String,
    /// Route the bootstrap protects and lands on after a handoff
    pub protected_route: String,
    /// Route the login flow pushes when there is nowhere to return to
    pub post_login_route: String,
    /// Query parameter carrying the handoff payload
    pub handoff_param: String,
    /// Query parameter carrying the return URL
    pub return_url_param: String,
    /// Query parameter marking a visit right after logout
    pub logout_param: String,
    pub backend: BackendKind,
    pub storage_mode: StorageMode,
    /// Whether token cookies carry `Secure`
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Extra platform suffixes whose subdomains share one cookie scope
    pub shared_parent_domains: Vec<String>,
    /// Pause before a cross-origin navigation so storage writes commit (500ms)
    pub handoff_commit_delay: Duration,
    /// Tokens expiring within this window count as expired (10s)
    pub expiry_leeway: Duration,
    /// Refresh on initialize even when the access token is still valid
    pub force_refresh_on_init: bool,
    /// When non-empty, return URLs must have one of these origins
    pub trusted_return_origins: Vec<String>,
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            auth_app_url: "http://localhost:3000".to_string(),
            login_route: "/login".to_string(),
            protected_route: "/dashboard".to_string(),
            post_login_route: "/dashboard".to_string(),
            handoff_param: "authToken".to_string(),
            return_url_param: "returnUrl".to_string(),
            logout_param: "logout".to_string(),
            backend: BackendKind::Mock,
            storage_mode: StorageMode::Cookies,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            shared_parent_domains: Vec::new(),
            handoff_commit_delay: Duration::from_millis(500),
            expiry_leeway: DEFAULT_EXPIRY_LEEWAY,
            force_refresh_on_init: false,
            trusted_return_origins: Vec::new(),
        }
    }
}

impl AuthClientConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    /// Read overrides from the process environment
    ///
    /// `AUTH_API_URL`, `AUTH_APP_URL`, `AUTH_BACKEND` (`mock`|`http`),
    /// `AUTH_STORAGE` (`cookies`|`local`), `AUTH_COOKIE_SECURE` (`true`|`false`).
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AuthResult<Self> {
        let mut config = Self::default();

        if let Some(api_url) = lookup("AUTH_API_URL") {
            config.api_url = api_url;
        }
        if let Some(auth_app_url) = lookup("AUTH_APP_URL") {
            config.auth_app_url = auth_app_url;
        }
        if let Some(backend) = lookup("AUTH_BACKEND") {
            config.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "mock" => BackendKind::Mock,
                "http" => BackendKind::Http,
                other => {
                    return Err(AuthError::Config(format!("AUTH_BACKEND: unknown backend {}", other)));
                }
            };
        }
        if let Some(storage) = lookup("AUTH_STORAGE") {
            config.storage_mode = match storage.trim().to_ascii_lowercase().as_str() {
                "cookies" | "cookie" => StorageMode::Cookies,
                "local" | "local_only" => StorageMode::LocalOnly,
                other => {
                    return Err(AuthError::Config(format!("AUTH_STORAGE: unknown mode {}", other)));
                }
            };
        }
        if let Some(secure) = lookup("AUTH_COOKIE_SECURE") {
            config.cookie_secure = secure
                .trim()
                .parse()
                .map_err(|_| AuthError::Config(format!("AUTH_COOKIE_SECURE: not a bool: {}", secure)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the URLs parse as absolute http(s) URLs
    pub fn validate(&self) -> AuthResult<()> {
        self.api_url()?;
        self.auth_app_url()?;
        Ok(())
    }

    pub fn api_url(&self) -> AuthResult<Url> {
        location::parse_absolute(&self.api_url)
            .map_err(|e| AuthError::Config(format!("api_url: {}", e)))
    }

    pub fn auth_app_url(&self) -> AuthResult<Url> {
        location::parse_absolute(&self.auth_app_url)
            .map_err(|e| AuthError::Config(format!("auth_app_url: {}", e)))
    }

    /// Whether `url` may be used as a return target
    pub fn is_trusted_return(&self, url: &Url) -> bool {
        if self.trusted_return_origins.is_empty() {
            return true;
        }
        let origin = location::origin_of(url);
        self.trusted_return_origins
            .iter()
            .any(|trusted| trusted.trim_end_matches('/') == origin)
    }
}

/// Mock backend configuration
#[derive(Debug, Clone)]
pub struct MockBackendConfig {
    /// HMAC key for token signing (32 bytes)
    pub token_secret: [u8; 32],
    /// Access token TTL (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token TTL (1 week)
    pub refresh_ttl: Duration,
    /// Artificial latency added to every call
    pub latency: Duration,
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            access_ttl: Duration::from_secs(15 * 60), // 15 minutes
            refresh_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            latency: Duration::ZERO,
        }
    }
}

impl MockBackendConfig {
    /// Create config with a random token secret
    pub fn with_random_secret() -> Self {
        Self {
            token_secret: platform::crypto::random_secret(),
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
