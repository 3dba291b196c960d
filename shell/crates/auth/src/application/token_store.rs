//! Token Store
//!
//! Origin-scoped persistence of the credential bundle. The only place that
//! knows the storage layout:
//!
//! - `Cookies`: `accessToken` / `refreshToken` cookies scoped by
//!   [`CookieScope`], user summary as JSON under local storage `userData`
//! - `LocalOnly`: the whole bundle as one JSON record under `authTokens`
//!
//! Malformed persisted data reads as "absent" and is logged, never returned
//! as an error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use platform::cookie::{self, CookieAttributes};
use serde::{Deserialize, Serialize};

use crate::application::config::{AuthClientConfig, SameSite, StorageMode};
use crate::domain::entity::{credential_bundle::CredentialBundle, user_summary::UserSummary};
use crate::domain::repository::{CookieStorage, LocalStorage};
use crate::domain::value_object::cookie_scope::CookieScope;
use crate::error::{AuthError, AuthResult};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const USER_DATA_KEY: &str = "userData";
pub const LOCAL_RECORD_KEY: &str = "authTokens";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalRecord {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<UserSummary>,
}

pub struct TokenStore {
    cookies: Arc<dyn CookieStorage>,
    local: Arc<dyn LocalStorage>,
    mode: StorageMode,
    scope: CookieScope,
    secure: bool,
    same_site: SameSite,
    /// Serializes multi-key writes against reads
    lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(
        cookies: Arc<dyn CookieStorage>,
        local: Arc<dyn LocalStorage>,
        hostname: &str,
        config: &AuthClientConfig,
    ) -> Self {
        let scope = CookieScope::for_hostname(hostname, &config.shared_parent_domains);
        tracing::debug!(hostname = %hostname, scope = %scope, mode = ?config.storage_mode, "Token store created");

        Self {
            cookies,
            local,
            mode: config.storage_mode,
            scope,
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
            lock: Mutex::new(()),
        }
    }

    pub fn scope(&self) -> &CookieScope {
        &self.scope
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes {
            domain: self.scope.domain_attribute().map(str::to_string),
            secure: self.secure,
            same_site: self.same_site,
            ..CookieAttributes::default()
        }
    }

    /// Persist a bundle
    ///
    /// The fallible local storage write happens first, so a refused write
    /// leaves the previous bundle fully in place.
    pub fn save(&self, bundle: &CredentialBundle) -> AuthResult<()> {
        bundle.validate()?;
        let _guard = self.guard();
        self.save_locked(bundle)
    }

    fn save_locked(&self, bundle: &CredentialBundle) -> AuthResult<()> {
        match self.mode {
            StorageMode::Cookies => {
                match bundle.user() {
                    Some(user) => {
                        let json = serde_json::to_string(user).map_err(|e| {
                            AuthError::Internal(format!("Failed to encode user: {}", e))
                        })?;
                        self.local.set_item(USER_DATA_KEY, &json)?;
                    }
                    None => self.local.remove_item(USER_DATA_KEY),
                }

                let attributes = self.cookie_attributes();
                self.cookies.assign(
                    &attributes.build_assignment(ACCESS_TOKEN_COOKIE, bundle.access_token()),
                );
                self.cookies.assign(
                    &attributes.build_assignment(REFRESH_TOKEN_COOKIE, bundle.refresh_token()),
                );
            }
            StorageMode::LocalOnly => {
                let record = LocalRecord {
                    access_token: bundle.access_token().to_string(),
                    refresh_token: bundle.refresh_token().to_string(),
                    user: bundle.user().cloned(),
                };
                let json = serde_json::to_string(&record).map_err(|e| {
                    AuthError::Internal(format!("Failed to encode token record: {}", e))
                })?;
                self.local.set_item(LOCAL_RECORD_KEY, &json)?;
            }
        }

        tracing::debug!(
            scope = %self.scope,
            has_user = bundle.user().is_some(),
            "Credential bundle saved"
        );
        Ok(())
    }

    /// Read the persisted bundle, or `None`
    pub fn load(&self) -> Option<CredentialBundle> {
        let _guard = self.guard();
        self.load_locked()
    }

    fn load_locked(&self) -> Option<CredentialBundle> {
        match self.mode {
            StorageMode::Cookies => self.load_from_cookies(),
            StorageMode::LocalOnly => self.load_from_local_record(),
        }
    }

    fn load_from_cookies(&self) -> Option<CredentialBundle> {
        let cookie_string = self.cookies.cookie_string();
        let access = cookie::find_cookie(&cookie_string, ACCESS_TOKEN_COOKIE);
        let refresh = cookie::find_cookie(&cookie_string, REFRESH_TOKEN_COOKIE);

        let (access, refresh) = match (access, refresh) {
            (None, None) => return None,
            (Some(access), Some(refresh)) => (access, refresh),
            (access, refresh) => {
                tracing::warn!(
                    has_access = access.is_some(),
                    has_refresh = refresh.is_some(),
                    "Incomplete token cookies, treating session as absent"
                );
                return None;
            }
        };

        let user = match self.local.get_item(USER_DATA_KEY) {
            None => None,
            Some(json) => match serde_json::from_str::<UserSummary>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Corrupt stored user data, treating session as absent");
                    return None;
                }
            },
        };

        Self::validated(CredentialBundle::new(access, refresh, user))
    }

    fn load_from_local_record(&self) -> Option<CredentialBundle> {
        let json = self.local.get_item(LOCAL_RECORD_KEY)?;
        let record: LocalRecord = match serde_json::from_str(&json) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt stored token record, treating session as absent");
                return None;
            }
        };

        Self::validated(CredentialBundle::new(
            record.access_token,
            record.refresh_token,
            record.user,
        ))
    }

    fn validated(bundle: AuthResult<CredentialBundle>) -> Option<CredentialBundle> {
        bundle
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Stored credentials invalid, treating session as absent");
            })
            .ok()
    }

    /// Remove every persisted credential; idempotent
    pub fn clear(&self) {
        let _guard = self.guard();

        let attributes = self.cookie_attributes();
        self.cookies.assign(&attributes.build_removal(ACCESS_TOKEN_COOKIE));
        self.cookies.assign(&attributes.build_removal(REFRESH_TOKEN_COOKIE));
        self.local.remove_item(USER_DATA_KEY);
        self.local.remove_item(LOCAL_RECORD_KEY);

        tracing::debug!(scope = %self.scope, "Credentials cleared");
    }

    /// Replace the stored user summary, keeping the tokens
    pub fn set_user(&self, user: Option<&UserSummary>) -> AuthResult<()> {
        let _guard = self.guard();

        match self.mode {
            StorageMode::Cookies => {
                match user {
                    Some(user) => {
                        let json = serde_json::to_string(user).map_err(|e| {
                            AuthError::Internal(format!("Failed to encode user: {}", e))
                        })?;
                        self.local.set_item(USER_DATA_KEY, &json)
                    }
                    None => {
                        self.local.remove_item(USER_DATA_KEY);
                        Ok(())
                    }
                }
            }
            // read-modify-write under one guard so a concurrent save is not undone
            StorageMode::LocalOnly => match self.load_locked() {
                Some(bundle) => self.save_locked(&bundle.with_user(user.cloned())),
                None => Err(AuthError::Unauthorized("Not signed in".to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_role::UserRole;
    use crate::infra::browser::SimulatedBrowser;

    fn store(host: &str, mode: StorageMode) -> (SimulatedBrowser, TokenStore) {
        let browser = SimulatedBrowser::new();
        let origin = format!("https://{}", host);
        let config = AuthClientConfig {
            storage_mode: mode,
            ..AuthClientConfig::default()
        };
        let store = TokenStore::new(
            Arc::new(browser.cookies_for(host)),
            Arc::new(browser.local_storage_for(&origin)),
            host,
            &config,
        );
        (browser, store)
    }

    fn bundle() -> CredentialBundle {
        CredentialBundle::new(
            "access-1",
            "refresh-1",
            Some(UserSummary::new("1", "Admin", "admin@example.com", UserRole::Admin)),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_both_modes() {
        for mode in [StorageMode::Cookies, StorageMode::LocalOnly] {
            let (_browser, store) = store("shop.example.com", mode);
            store.save(&bundle()).unwrap();
            assert_eq!(store.load(), Some(bundle()), "mode {:?}", mode);
        }
    }

    #[test]
    fn test_cookies_use_computed_scope() {
        let (browser, store) = store("shop.example.com", StorageMode::Cookies);
        store.save(&bundle()).unwrap();

        // a sibling subdomain shares the parent-scoped cookies
        let sibling = browser.cookies_for("admin.example.com");
        assert!(sibling.cookie_string().contains("accessToken=access-1"));
        assert!(browser.cookies_for("example.org").cookie_string().is_empty());
    }

    #[test]
    fn test_rejected_save_keeps_previous_bundle() {
        let (_browser, store) = store("shop.example.com", StorageMode::Cookies);
        store.save(&bundle()).unwrap();

        let invalid = CredentialBundle::new_unchecked("", "refresh-2", None);
        assert!(matches!(store.save(&invalid), Err(AuthError::InvalidBundle(_))));
        assert_eq!(store.load(), Some(bundle()));
    }

    #[test]
    fn test_corrupt_user_data_reads_as_absent() {
        let (browser, store) = store("shop.example.com", StorageMode::Cookies);
        store.save(&bundle()).unwrap();
        browser
            .local_storage_for("https://shop.example.com")
            .set_item(USER_DATA_KEY, "{not json")
            .unwrap();

        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_corrupt_local_record_reads_as_absent() {
        let (browser, store) = store("localhost", StorageMode::LocalOnly);
        browser
            .local_storage_for("https://localhost")
            .set_item(LOCAL_RECORD_KEY, r#"{"accessToken":"a"}"#)
            .unwrap();

        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_half_present_cookies_read_as_absent() {
        let (browser, store) = store("localhost", StorageMode::Cookies);
        browser
            .cookies_for("localhost")
            .assign("accessToken=only-access; Path=/");

        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_browser, store) = store("shop.example.com", StorageMode::Cookies);
        store.save(&bundle()).unwrap();

        store.clear();
        assert_eq!(store.load(), None);
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_refused_write_leaves_store_untouched() {
        let (browser, store) = store("shop.example.com", StorageMode::Cookies);
        store.save(&bundle()).unwrap();
        browser
            .local_storage_for("https://shop.example.com")
            .set_quota(Some(0));

        let next = CredentialBundle::new(
            "access-2",
            "refresh-2",
            Some(UserSummary::new("2", "User", "user@example.com", UserRole::User)),
        )
        .unwrap();
        assert!(matches!(store.save(&next), Err(AuthError::Storage(_))));
        assert_eq!(store.load(), Some(bundle()));
    }

    #[test]
    fn test_set_user_replaces_summary_only() {
        for mode in [StorageMode::Cookies, StorageMode::LocalOnly] {
            let (_browser, store) = store("shop.example.com", mode);
            store.save(&bundle()).unwrap();

            let renamed = UserSummary::new("1", "Root", "admin@example.com", UserRole::Admin);
            store.set_user(Some(&renamed)).unwrap();

            let loaded = store.load().unwrap();
            assert_eq!(loaded.access_token(), "access-1");
            assert_eq!(loaded.user(), Some(&renamed));
        }
    }

    #[test]
    fn test_unknown_role_round_trips() {
        for mode in [StorageMode::Cookies, StorageMode::LocalOnly] {
            let (_browser, store) = store("shop.example.com", mode);
            let auditor = CredentialBundle::new(
                "access-1",
                "refresh-1",
                Some(UserSummary::new("3", "Audit", "audit@example.com", UserRole::from_code("Auditor"))),
            )
            .unwrap();

            store.save(&auditor).unwrap();
            assert_eq!(store.load(), Some(auditor), "mode {:?}", mode);
        }
    }

    /// Local storage where another tab saves newer tokens while the
    /// record is being read
    struct SaveDuringRead {
        inner: crate::infra::browser::OriginStorage,
        store: std::sync::OnceLock<std::sync::Weak<TokenStore>>,
        newer: CredentialBundle,
        fired: std::sync::atomic::AtomicBool,
        writer: Mutex<Option<std::thread::JoinHandle<()>>>,
    }

    impl LocalStorage for SaveDuringRead {
        fn get_item(&self, key: &str) -> Option<String> {
            let value = self.inner.get_item(key);
            if key != LOCAL_RECORD_KEY {
                return value;
            }
            if let Some(store) = self.store.get().and_then(std::sync::Weak::upgrade) {
                if !self.fired.swap(true, std::sync::atomic::Ordering::SeqCst) {
                    let newer = self.newer.clone();
                    let handle = std::thread::spawn(move || store.save(&newer).unwrap());
                    *self.writer.lock().unwrap() = Some(handle);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                }
            }
            value
        }

        fn set_item(&self, key: &str, value: &str) -> AuthResult<()> {
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn test_set_user_does_not_undo_a_concurrent_save() {
        let browser = SimulatedBrowser::new();
        let newer = CredentialBundle::new(
            "access-2",
            "refresh-2",
            Some(UserSummary::new("1", "Admin", "admin@example.com", UserRole::Admin)),
        )
        .unwrap();
        let local = Arc::new(SaveDuringRead {
            inner: browser.local_storage_for("http://localhost:3000"),
            store: std::sync::OnceLock::new(),
            newer: newer.clone(),
            fired: Default::default(),
            writer: Mutex::new(None),
        });
        let config = AuthClientConfig {
            storage_mode: StorageMode::LocalOnly,
            ..AuthClientConfig::default()
        };
        let store = Arc::new(TokenStore::new(
            Arc::new(browser.cookies_for("localhost")),
            local.clone(),
            "localhost",
            &config,
        ));
        // seed before the hook is armed
        store.save(&bundle()).unwrap();
        local.store.set(Arc::downgrade(&store)).unwrap();

        let renamed = UserSummary::new("1", "Root", "admin@example.com", UserRole::Admin);
        store.set_user(Some(&renamed)).unwrap();
        local.writer.lock().unwrap().take().unwrap().join().unwrap();

        // the newer tokens landed after the user update and were not
        // overwritten by the rotated ones
        assert_eq!(store.load(), Some(newer));
    }
}
