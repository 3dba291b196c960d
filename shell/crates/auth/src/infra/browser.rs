//! Simulated Browser
//!
//! In-memory browser environment: one cookie jar shared by every host
//! (RFC 6265 domain matching), one local storage area per origin, and
//! pages that record their navigations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use platform::cookie;
use platform::location;
use url::Url;

use crate::domain::gateway::Page;
use crate::domain::repository::{CookieStorage, LocalStorage};
use crate::error::{AuthError, AuthResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Browser
// ============================================================================

#[derive(Debug, Clone)]
struct StoredCookie {
    name: String,
    value: String,
    /// Lowercased, without the legacy leading dot
    domain: String,
    host_only: bool,
    path: String,
}

impl StoredCookie {
    fn visible_to(&self, host: &str) -> bool {
        if self.host_only {
            self.domain == host
        } else {
            cookie::domain_matches(host, &self.domain)
        }
    }

    fn same_identity(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

#[derive(Debug, Default)]
struct StorageArea {
    items: HashMap<String, String>,
    /// Total bytes (keys + values) the area accepts
    quota: Option<usize>,
}

/// Cookie jar plus per-origin local storage
#[derive(Debug, Clone, Default)]
pub struct SimulatedBrowser {
    cookies: Arc<Mutex<Vec<StoredCookie>>>,
    storage: Arc<Mutex<HashMap<String, StorageArea>>>,
}

impl SimulatedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// `document.cookie` of a page served from `host`
    pub fn cookies_for(&self, host: &str) -> DocumentCookies {
        DocumentCookies {
            host: host.trim_end_matches('.').to_ascii_lowercase(),
            jar: Arc::clone(&self.cookies),
        }
    }

    /// `localStorage` of `origin` (`https://host[:port]`)
    pub fn local_storage_for(&self, origin: &str) -> OriginStorage {
        OriginStorage {
            origin: origin.trim_end_matches('/').to_string(),
            areas: Arc::clone(&self.storage),
        }
    }

    /// Number of cookies in the jar, across every domain
    pub fn cookie_count(&self) -> usize {
        lock(&self.cookies).len()
    }
}

// ============================================================================
// Cookies
// ============================================================================

/// One host's view of the shared jar
#[derive(Debug, Clone)]
pub struct DocumentCookies {
    host: String,
    jar: Arc<Mutex<Vec<StoredCookie>>>,
}

impl CookieStorage for DocumentCookies {
    fn cookie_string(&self) -> String {
        lock(&self.jar)
            .iter()
            .filter(|c| c.visible_to(&self.host))
            .map(|c| format!("{}={}", c.name, cookie::encode_value(&c.value)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn assign(&self, assignment: &str) {
        let Some(parsed) = cookie::parse_assignment(assignment) else {
            tracing::debug!(host = %self.host, "Ignoring unparsable cookie assignment");
            return;
        };

        let (domain, host_only) = match &parsed.attributes.domain {
            Some(domain) => {
                let domain = domain.trim_start_matches('.').to_string();
                if !cookie::domain_matches(&self.host, &domain) {
                    tracing::debug!(
                        host = %self.host,
                        domain = %domain,
                        cookie = %parsed.name,
                        "Browser refused cookie for foreign domain"
                    );
                    return;
                }
                (domain, false)
            }
            None => (self.host.clone(), true),
        };

        let stored = StoredCookie {
            name: parsed.name.clone(),
            value: parsed.value.clone(),
            domain,
            host_only,
            path: parsed.attributes.path.clone(),
        };

        let mut jar = lock(&self.jar);
        jar.retain(|existing| !existing.same_identity(&stored));
        if !parsed.is_removal() {
            jar.push(stored);
        }
    }
}

// ============================================================================
// Local storage
// ============================================================================

/// One origin's storage area
#[derive(Debug, Clone)]
pub struct OriginStorage {
    origin: String,
    areas: Arc<Mutex<HashMap<String, StorageArea>>>,
}

impl OriginStorage {
    /// Limit the area size; `Some(0)` refuses every write
    pub fn set_quota(&self, quota: Option<usize>) {
        lock(&self.areas).entry(self.origin.clone()).or_default().quota = quota;
    }

    pub fn keys(&self) -> Vec<String> {
        let areas = lock(&self.areas);
        let mut keys: Vec<String> = areas
            .get(&self.origin)
            .map(|area| area.items.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl LocalStorage for OriginStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.areas)
            .get(&self.origin)
            .and_then(|area| area.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut areas = lock(&self.areas);
        let area = areas.entry(self.origin.clone()).or_default();

        if let Some(quota) = area.quota {
            let others: usize = area
                .items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(AuthError::Storage(format!(
                    "QuotaExceededError: {} exceeds {} bytes",
                    key, quota
                )));
            }
        }

        area.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        if let Some(area) = lock(&self.areas).get_mut(&self.origin) {
            area.items.remove(key);
        }
    }
}

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    HistoryReplaced(Url),
    Navigated(Url),
    RoutePushed(String),
    Reloaded,
}

/// A page that records what the shell asked it to do
#[derive(Debug)]
pub struct SimulatedPage {
    location: Mutex<Url>,
    events: Mutex<Vec<PageEvent>>,
    soft_navigation_fails: AtomicBool,
}

impl SimulatedPage {
    pub fn new(url: Url) -> Self {
        Self {
            location: Mutex::new(url),
            events: Mutex::new(Vec::new()),
            soft_navigation_fails: AtomicBool::new(false),
        }
    }

    pub fn open(raw: &str) -> AuthResult<Self> {
        Ok(Self::new(location::parse_absolute(raw)?))
    }

    pub fn hostname(&self) -> String {
        lock(&self.location).host_str().unwrap_or_default().to_string()
    }

    pub fn origin(&self) -> String {
        location::origin_of(&lock(&self.location))
    }

    /// Make `push_route` fail (router not ready)
    pub fn fail_soft_navigation(&self, fail: bool) {
        self.soft_navigation_fails.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<PageEvent> {
        lock(&self.events).clone()
    }

    /// Full-page navigations issued so far
    pub fn navigations(&self) -> Vec<Url> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                PageEvent::Navigated(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: PageEvent) {
        lock(&self.events).push(event);
    }
}

impl Page for SimulatedPage {
    fn location(&self) -> Url {
        lock(&self.location).clone()
    }

    fn replace_history(&self, url: &Url) {
        *lock(&self.location) = url.clone();
        self.record(PageEvent::HistoryReplaced(url.clone()));
    }

    fn navigate(&self, url: &Url) {
        *lock(&self.location) = url.clone();
        self.record(PageEvent::Navigated(url.clone()));
    }

    fn push_route(&self, route: &str) -> AuthResult<()> {
        if self.soft_navigation_fails.load(Ordering::SeqCst) {
            return Err(AuthError::Navigation(format!("router refused {}", route)));
        }

        let target = location::join_route(&self.location(), route)
            .map_err(|e| AuthError::Navigation(e.to_string()))?;
        *lock(&self.location) = target;
        self.record(PageEvent::RoutePushed(route.to_string()));
        Ok(())
    }

    fn reload(&self) {
        self.record(PageEvent::Reloaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_domain_cookie_visible_to_siblings() {
        let browser = SimulatedBrowser::new();
        browser
            .cookies_for("shop.example.com")
            .assign("token=abc; Domain=.example.com; Path=/");

        assert_eq!(browser.cookies_for("admin.example.com").cookie_string(), "token=abc");
        assert_eq!(browser.cookies_for("example.com").cookie_string(), "token=abc");
        assert_eq!(browser.cookies_for("example.org").cookie_string(), "");
    }

    #[test]
    fn test_host_only_cookie_stays_on_host() {
        let browser = SimulatedBrowser::new();
        browser.cookies_for("localhost").assign("token=abc; Path=/");

        assert_eq!(browser.cookies_for("localhost").cookie_string(), "token=abc");
        assert_eq!(browser.cookies_for("app.localhost").cookie_string(), "");
    }

    #[test]
    fn test_foreign_domain_refused() {
        let browser = SimulatedBrowser::new();
        browser
            .cookies_for("shop.example.com")
            .assign("token=abc; Domain=.other.com; Path=/");

        assert_eq!(browser.cookie_count(), 0);
    }

    #[test]
    fn test_removal_needs_matching_domain() {
        let browser = SimulatedBrowser::new();
        let cookies = browser.cookies_for("shop.example.com");
        cookies.assign("token=abc; Domain=.example.com; Path=/");

        cookies.assign("token=; Path=/; Max-Age=0");
        assert_eq!(browser.cookie_count(), 1);

        cookies.assign("token=; Domain=.example.com; Path=/; Max-Age=0");
        assert_eq!(browser.cookie_count(), 0);
    }

    #[test]
    fn test_local_storage_is_per_origin() {
        let browser = SimulatedBrowser::new();
        let shop = browser.local_storage_for("https://shop.example.com");
        shop.set_item("k", "v").unwrap();

        assert_eq!(shop.get_item("k").as_deref(), Some("v"));
        assert_eq!(browser.local_storage_for("https://admin.example.com").get_item("k"), None);

        shop.remove_item("k");
        assert!(shop.keys().is_empty());
    }

    #[test]
    fn test_quota() {
        let browser = SimulatedBrowser::new();
        let storage = browser.local_storage_for("http://localhost:3000");
        storage.set_quota(Some(4));

        assert!(storage.set_item("a", "bc").is_ok());
        assert!(matches!(storage.set_item("b", "cd"), Err(AuthError::Storage(_))));
        assert!(storage.set_item("a", "xyz").is_ok());
    }

    #[test]
    fn test_page_records_events() {
        let page = SimulatedPage::open("http://localhost:3001/?authToken=x").unwrap();
        page.push_route("/dashboard").unwrap();
        page.fail_soft_navigation(true);
        assert!(page.push_route("/settings").is_err());
        page.reload();

        assert_eq!(page.location().as_str(), "http://localhost:3001/dashboard");
        assert_eq!(
            page.events(),
            vec![PageEvent::RoutePushed("/dashboard".into()), PageEvent::Reloaded]
        );
    }
}
