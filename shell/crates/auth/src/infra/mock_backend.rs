//! Mock Auth Backend
//!
//! In-process backend with a fixed user table. Issues HS256 JWT-shaped
//! tokens, rotates refresh tokens and revokes them on logout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use platform::crypto;
use platform::password::{ClearTextPassword, HashedPassword};
use uuid::Uuid;

use crate::application::config::MockBackendConfig;
use crate::domain::entity::{
    credential_bundle::CredentialBundle,
    credentials::{LoginCredentials, PasswordChange, ProfileUpdate, RegisterCredentials},
    user_summary::UserSummary,
};
use crate::domain::gateway::AuthBackend;
use crate::domain::value_object::{
    access_token::{self, TokenClaims, TokenType},
    email::Email,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Reset tokens live for 30 minutes
const RESET_TOKEN_TTL: TimeDelta = TimeDelta::minutes(30);

/// Seed users: `(name, email, password, role)`
const SEED_USERS: [(&str, &str, &str, UserRole); 2] = [
    ("Admin User", "admin@example.com", "admin123", UserRole::Admin),
    ("Regular User", "user@example.com", "user123", UserRole::User),
];

#[derive(Debug, Clone)]
struct MockUser {
    id: u64,
    name: String,
    email: Email,
    role: UserRole,
    password: HashedPassword,
}

impl MockUser {
    fn summary(&self) -> UserSummary {
        UserSummary::new(
            self.id.to_string(),
            self.name.clone(),
            self.email.as_str(),
            self.role.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct MockTables {
    users: Vec<MockUser>,
    next_id: u64,
    /// Refresh token `jti` → user id
    active_refresh: HashMap<String, u64>,
    /// Reset token → (user id, expiry)
    reset_tokens: HashMap<String, (u64, DateTime<Utc>)>,
}

impl MockTables {
    fn user_by_email(&self, email: &Email) -> Option<&MockUser> {
        self.users.iter().find(|user| &user.email == email)
    }

    fn user_by_id_mut(&mut self, id: u64) -> Option<&mut MockUser> {
        self.users.iter_mut().find(|user| user.id == id)
    }
}

pub struct MockAuthBackend {
    config: MockBackendConfig,
    tables: Mutex<MockTables>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl MockAuthBackend {
    /// Create the backend with the seed users
    pub fn new(config: MockBackendConfig) -> AuthResult<Self> {
        let mut tables = MockTables {
            next_id: 1,
            ..MockTables::default()
        };

        for (name, email, password, role) in SEED_USERS {
            let password = ClearTextPassword::new(password)?.hash()?;
            tables.users.push(MockUser {
                id: tables.next_id,
                name: name.to_string(),
                email: Email::new(email)?,
                role,
                password,
            });
            tables.next_id += 1;
        }

        tracing::debug!(users = tables.users.len(), "Mock auth backend seeded");

        Ok(Self {
            config,
            tables: Mutex::new(tables),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        })
    }

    /// Number of refresh requests received
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of logout requests received
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    /// Issue an access token for a known user with a chosen lifetime
    /// (negative for an already expired token)
    pub fn mint_access_token(&self, email: &str, expires_in: TimeDelta) -> AuthResult<String> {
        let email = Email::new(email)?;
        let tables = self.tables();
        let user = tables
            .user_by_email(&email)
            .ok_or_else(|| AuthError::Rejected {
                status: 404,
                message: "User not found".to_string(),
            })?;

        let now = Utc::now();
        let claims = Self::claims(user, TokenType::Access, now, now + expires_in);
        access_token::sign(&claims, &self.config.token_secret)
    }

    /// The reset token "mailed" to `email`, if one is pending
    pub fn pending_reset_token(&self, email: &str) -> Option<String> {
        let email = Email::new(email).ok()?;
        let tables = self.tables();
        let user_id = tables.user_by_email(&email)?.id;

        tables
            .reset_tokens
            .iter()
            .find(|(_, (id, _))| *id == user_id)
            .map(|(token, _)| token.clone())
    }

    fn tables(&self) -> MutexGuard<'_, MockTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn claims(
        user: &MockUser,
        typ: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> TokenClaims {
        TokenClaims {
            sub: user.id.to_string(),
            email: Some(user.email.to_string()),
            role: Some(user.role.clone()),
            typ,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// `now + duration`, saturating at the end of the representable range
    fn expiry(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
        TimeDelta::from_std(duration)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn issue_bundle(&self, tables: &mut MockTables, user_id: u64) -> AuthResult<CredentialBundle> {
        let user = tables
            .users
            .iter()
            .find(|user| user.id == user_id)
            .ok_or_else(|| AuthError::Unauthorized("User no longer exists".to_string()))?
            .clone();

        let now = Utc::now();
        let access_claims = Self::claims(
            &user,
            TokenType::Access,
            now,
            Self::expiry(now, self.config.access_ttl),
        );
        let refresh_claims = Self::claims(
            &user,
            TokenType::Refresh,
            now,
            Self::expiry(now, self.config.refresh_ttl),
        );

        let access = access_token::sign(&access_claims, &self.config.token_secret)?;
        let refresh = access_token::sign(&refresh_claims, &self.config.token_secret)?;
        tables.active_refresh.insert(refresh_claims.jti, user.id);

        CredentialBundle::new(access, refresh, Some(user.summary()))
    }

    /// Verify an access token presented as a bearer
    fn authenticate(&self, token: &str) -> AuthResult<u64> {
        let claims = access_token::verify(token, &self.config.token_secret)?;

        if claims.typ != TokenType::Access {
            return Err(AuthError::Unauthorized("Invalid token".to_string()));
        }
        if claims.is_expired_at(Utc::now()) {
            return Err(AuthError::Unauthorized("Token expired".to_string()));
        }

        claims
            .sub
            .parse()
            .map_err(|_| AuthError::Unauthorized("Invalid token".to_string()))
    }

    fn email_taken(tables: &MockTables, email: &Email, except: Option<u64>) -> bool {
        tables
            .users
            .iter()
            .any(|user| &user.email == email && Some(user.id) != except)
    }
}

impl AuthBackend for MockAuthBackend {
    async fn login(&self, credentials: &LoginCredentials) -> AuthResult<CredentialBundle> {
        self.simulate_latency().await;

        let invalid = || AuthError::Unauthorized(INVALID_CREDENTIALS.to_string());
        let email = Email::new(credentials.email.as_str()).map_err(|_| invalid())?;
        let password = ClearTextPassword::for_verification(credentials.password.as_str());

        let mut tables = self.tables();
        let user_id = match tables.user_by_email(&email) {
            Some(user) if user.password.verify(&password) => user.id,
            _ => {
                tracing::warn!(email_domain = %email.domain(), "Mock login rejected");
                return Err(invalid());
            }
        };

        tracing::info!(user_id, "Mock login succeeded");
        self.issue_bundle(&mut tables, user_id)
    }

    async fn register(&self, credentials: &RegisterCredentials) -> AuthResult<CredentialBundle> {
        self.simulate_latency().await;

        let name = credentials.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        let email = Email::new(credentials.email.as_str())?;
        let password = ClearTextPassword::new(credentials.password.as_str())?.hash()?;

        let mut tables = self.tables();
        if Self::email_taken(&tables, &email, None) {
            return Err(AuthError::Rejected {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }

        let id = tables.next_id;
        tables.next_id += 1;
        tables.users.push(MockUser {
            id,
            name: name.to_string(),
            email,
            role: UserRole::User,
            password,
        });

        tracing::info!(user_id = id, "Mock user registered");
        self.issue_bundle(&mut tables, id)
    }

    async fn logout(&self, access_token: Option<&str>) -> AuthResult<()> {
        self.simulate_latency().await;
        self.logout_calls.fetch_add(1, Ordering::SeqCst);

        // an expired access token still identifies whose tokens to revoke
        let user_id = access_token
            .and_then(|token| access_token::verify(token, &self.config.token_secret).ok())
            .and_then(|claims| claims.sub.parse::<u64>().ok());

        if let Some(user_id) = user_id {
            let mut tables = self.tables();
            tables.active_refresh.retain(|_, owner| *owner != user_id);
            tracing::info!(user_id, "Mock logout revoked refresh tokens");
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<CredentialBundle> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let claims = access_token::verify(refresh_token, &self.config.token_secret)
            .map_err(|_| AuthError::Unauthorized("Invalid refresh token".to_string()))?;
        if claims.typ != TokenType::Refresh {
            return Err(AuthError::Unauthorized("Invalid refresh token".to_string()));
        }
        if claims.is_expired_at(Utc::now()) {
            return Err(AuthError::Unauthorized("Refresh token expired".to_string()));
        }

        let mut tables = self.tables();
        let Some(user_id) = tables.active_refresh.remove(&claims.jti) else {
            tracing::warn!("Mock refresh with a revoked or rotated token");
            return Err(AuthError::Unauthorized("Refresh token revoked".to_string()));
        };

        self.issue_bundle(&mut tables, user_id)
    }

    async fn profile(&self, access_token: &str) -> AuthResult<UserSummary> {
        self.simulate_latency().await;
        let user_id = self.authenticate(access_token)?;

        let mut tables = self.tables();
        tables
            .user_by_id_mut(user_id)
            .map(|user| user.summary())
            .ok_or_else(|| AuthError::Unauthorized("User no longer exists".to_string()))
    }

    async fn update_profile(
        &self,
        access_token: &str,
        update: &ProfileUpdate,
    ) -> AuthResult<UserSummary> {
        self.simulate_latency().await;
        let user_id = self.authenticate(access_token)?;

        let name = match &update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AuthError::Validation("Name cannot be empty".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let email = update.email.as_deref().map(Email::new).transpose()?;

        let mut tables = self.tables();
        if let Some(email) = &email {
            if Self::email_taken(&tables, email, Some(user_id)) {
                return Err(AuthError::Rejected {
                    status: 409,
                    message: "Email already registered".to_string(),
                });
            }
        }

        let user = tables
            .user_by_id_mut(user_id)
            .ok_or_else(|| AuthError::Unauthorized("User no longer exists".to_string()))?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }

        tracing::info!(user_id, "Mock profile updated");
        Ok(user.summary())
    }

    async fn change_password(&self, access_token: &str, change: &PasswordChange) -> AuthResult<()> {
        self.simulate_latency().await;
        let user_id = self.authenticate(access_token)?;

        let current = ClearTextPassword::for_verification(change.current_password.as_str());
        let replacement = ClearTextPassword::new(change.new_password.as_str())?;

        let stored = self
            .tables()
            .user_by_id_mut(user_id)
            .map(|user| user.password.clone())
            .ok_or_else(|| AuthError::Unauthorized("User no longer exists".to_string()))?;
        if !stored.verify(&current) {
            return Err(AuthError::Validation("Current password is incorrect".to_string()));
        }

        let hashed = replacement.hash()?;
        if let Some(user) = self.tables().user_by_id_mut(user_id) {
            user.password = hashed;
        }

        tracing::info!(user_id, "Mock password changed");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> AuthResult<()> {
        self.simulate_latency().await;
        let email = Email::new(email)?;

        let mut tables = self.tables();
        let Some(user_id) = tables.user_by_email(&email).map(|user| user.id) else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = crypto::to_base64url(&crypto::random_bytes(24));
        tables.reset_tokens.retain(|_, (owner, _)| *owner != user_id);
        tables
            .reset_tokens
            .insert(token, (user_id, Utc::now() + RESET_TOKEN_TTL));

        tracing::info!(user_id, "Mock password reset token issued");
        Ok(())
    }

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> AuthResult<()> {
        self.simulate_latency().await;
        let hashed = ClearTextPassword::new(new_password)?.hash()?;

        let mut tables = self.tables();
        let invalid = || AuthError::Validation("Reset token is invalid or expired".to_string());
        let (user_id, expires_at) = tables.reset_tokens.remove(reset_token).ok_or_else(invalid)?;
        if expires_at <= Utc::now() {
            return Err(invalid());
        }

        let user = tables.user_by_id_mut(user_id).ok_or_else(invalid)?;
        user.password = hashed;
        // a reset ends every session of the user
        tables.active_refresh.retain(|_, owner| *owner != user_id);

        tracing::info!(user_id, "Mock password reset completed");
        Ok(())
    }
}
