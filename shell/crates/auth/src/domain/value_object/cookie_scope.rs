//! Cookie Scope Value Object
//!
//! Decides which `Domain=` attribute the token cookies get for a hostname.

use std::fmt;
use std::net::IpAddr;

/// Platform suffix whose preview deployments share credentials
const PREVIEW_PLATFORM_SUFFIX: &str = "vercel.app";

/// Effective cookie scope for a hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieScope {
    /// Host-only cookie, no `Domain=` attribute
    Unscoped,
    /// Shared with every subdomain of the parent (`.example.com`)
    Domain(String),
}

impl CookieScope {
    /// Pure hostname → scope policy
    ///
    /// `shared_parents` lists extra platform suffixes (`netlify.app`) whose
    /// subdomains should share one scope; they are checked before the
    /// built-in rules.
    pub fn for_hostname(hostname: &str, shared_parents: &[String]) -> Self {
        let host = hostname.trim().trim_end_matches('.').to_ascii_lowercase();

        for parent in shared_parents
            .iter()
            .map(|p| p.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|p| !p.is_empty())
        {
            if host == parent || host.ends_with(&format!(".{}", parent)) {
                return CookieScope::Domain(format!(".{}", parent));
            }
        }

        if host.ends_with(PREVIEW_PLATFORM_SUFFIX) {
            return CookieScope::Domain(format!(".{}", PREVIEW_PLATFORM_SUFFIX));
        }

        if host.is_empty() || host == "localhost" || is_ip_literal(&host) {
            return CookieScope::Unscoped;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() > 2 {
            return CookieScope::Domain(format!(".{}", labels[labels.len() - 2..].join(".")));
        }

        CookieScope::Unscoped
    }

    /// Value for the `Domain=` attribute
    pub fn domain_attribute(&self) -> Option<&str> {
        match self {
            CookieScope::Unscoped => None,
            CookieScope::Domain(domain) => Some(domain),
        }
    }
}

fn is_ip_literal(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}

impl fmt::Display for CookieScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieScope::Unscoped => f.write_str("unscoped"),
            CookieScope::Domain(domain) => f.write_str(domain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(host: &str) -> CookieScope {
        CookieScope::for_hostname(host, &[])
    }

    #[test]
    fn test_localhost_is_unscoped() {
        assert_eq!(scope("localhost"), CookieScope::Unscoped);
        assert_eq!(scope("LOCALHOST"), CookieScope::Unscoped);
    }

    #[test]
    fn test_ip_literals_are_unscoped() {
        assert_eq!(scope("127.0.0.1"), CookieScope::Unscoped);
        assert_eq!(scope("192.168.10.20"), CookieScope::Unscoped);
        assert_eq!(scope("[::1]"), CookieScope::Unscoped);
    }

    #[test]
    fn test_single_level_domain_is_unscoped() {
        assert_eq!(scope("example.com"), CookieScope::Unscoped);
        assert_eq!(scope("intranet"), CookieScope::Unscoped);
    }

    #[test]
    fn test_multi_level_domain_shares_parent() {
        assert_eq!(scope("shop.example.com"), CookieScope::Domain(".example.com".into()));
        assert_eq!(scope("a.b.example.com"), CookieScope::Domain(".example.com".into()));
    }

    #[test]
    fn test_preview_deployment_domain() {
        assert_eq!(
            scope("app.preview.vercel.app"),
            CookieScope::Domain(".vercel.app".into())
        );
        assert_eq!(scope("shop-git-main.vercel.app"), CookieScope::Domain(".vercel.app".into()));
    }

    #[test]
    fn test_configured_shared_parent_wins() {
        let parents = vec!["netlify.app".to_string()];
        assert_eq!(
            CookieScope::for_hostname("deploy-preview-3--shop.netlify.app", &parents),
            CookieScope::Domain(".netlify.app".into())
        );
        assert_eq!(
            CookieScope::for_hostname("shop.example.com", &parents),
            CookieScope::Domain(".example.com".into())
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(scope("Shop.Example.com."), scope("shop.example.com"));
        assert_eq!(scope("shop.example.com").domain_attribute(), Some(".example.com"));
        assert_eq!(scope("localhost").domain_attribute(), None);
    }
}
