//! Repository Traits
//!
//! Browser storage the token store persists into. Implementations are in
//! the infrastructure layer.

use crate::error::AuthResult;

/// `document.cookie` as seen by one page
///
/// Reads return every cookie visible to the page's host as `a=1; b=2`;
/// writes take one assignment string (`name=value; Domain=..; Path=/`),
/// exactly like the browser property.
pub trait CookieStorage: Send + Sync {
    /// `document.cookie` read
    fn cookie_string(&self) -> String;

    /// `document.cookie = assignment`; the browser silently ignores
    /// assignments it refuses
    fn assign(&self, assignment: &str);
}

/// `window.localStorage` of one origin
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Fails when the browser refuses the write (quota, private mode)
    fn set_item(&self, key: &str, value: &str) -> AuthResult<()>;

    fn remove_item(&self, key: &str);
}
