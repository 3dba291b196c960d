//! Redirect Intent
//!
//! The single pending "return URL" of an origin. Set before navigating away
//! to authenticate, consumed exactly once afterwards, cleared on logout.

use std::sync::Arc;

use platform::location;
use url::Url;

use crate::domain::repository::LocalStorage;
use crate::error::AuthResult;

pub const REDIRECT_INTENT_KEY: &str = "auth_redirect_url";

pub struct RedirectIntentStore {
    local: Arc<dyn LocalStorage>,
}

impl RedirectIntentStore {
    pub fn new(local: Arc<dyn LocalStorage>) -> Self {
        Self { local }
    }

    /// Replace any pending intent
    pub fn set(&self, url: &Url) -> AuthResult<()> {
        self.local.set_item(REDIRECT_INTENT_KEY, url.as_str())?;
        tracing::debug!(target_origin = %location::origin_of(url), "Redirect intent recorded");
        Ok(())
    }

    /// Read without consuming
    pub fn peek(&self) -> Option<Url> {
        let raw = self.local.get_item(REDIRECT_INTENT_KEY)?;
        match location::parse_absolute(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparsable redirect intent");
                self.clear();
                None
            }
        }
    }

    /// Read and remove
    pub fn take(&self) -> Option<Url> {
        let url = self.peek();
        self.clear();
        url
    }

    pub fn clear(&self) {
        self.local.remove_item(REDIRECT_INTENT_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::browser::SimulatedBrowser;

    fn store() -> (SimulatedBrowser, RedirectIntentStore) {
        let browser = SimulatedBrowser::new();
        let store = RedirectIntentStore::new(Arc::new(
            browser.local_storage_for("http://localhost:3000"),
        ));
        (browser, store)
    }

    #[test]
    fn test_consumed_exactly_once() {
        let (_browser, store) = store();
        let url = Url::parse("http://localhost:3001/dashboard").unwrap();
        store.set(&url).unwrap();

        assert_eq!(store.peek(), Some(url.clone()));
        assert_eq!(store.take(), Some(url));
        assert_eq!(store.take(), None);
    }

    #[test]
    fn test_garbage_is_discarded() {
        let (browser, store) = store();
        browser
            .local_storage_for("http://localhost:3000")
            .set_item(REDIRECT_INTENT_KEY, "javascript:alert(1)")
            .unwrap();

        assert_eq!(store.peek(), None);
        assert!(browser.local_storage_for("http://localhost:3000").keys().is_empty());
    }
}
