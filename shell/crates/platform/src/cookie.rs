//! Cookie Strings
//!
//! Building and parsing the strings a browser exchanges through
//! `document.cookie`, plus the RFC 6265 domain-match rule.

use url::form_urlencoded;

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// Attributes attached to a cookie assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    /// `Domain=` attribute; `None` makes a host-only cookie
    pub domain: Option<String>,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            domain: None,
            path: "/".to_string(),
            secure: true,
            same_site: SameSite::Lax,
            max_age_secs: None,
        }
    }
}

impl CookieAttributes {
    /// Build a `document.cookie` assignment
    pub fn build_assignment(&self, name: &str, value: &str) -> String {
        let mut cookie = format!("{}={}", name, encode_value(value));

        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        cookie.push_str(&format!("; Path={}", self.path));
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build an assignment that expires the cookie
    ///
    /// Domain and path must match the ones used when setting it.
    pub fn build_removal(&self, name: &str) -> String {
        let mut cookie = format!("{}=", name);
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        cookie.push_str(&format!(
            "; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.path
        ));
        cookie
    }
}

/// A parsed cookie assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAssignment {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl CookieAssignment {
    /// Whether the assignment deletes the cookie
    pub fn is_removal(&self) -> bool {
        matches!(self.attributes.max_age_secs, Some(age) if age <= 0)
    }
}

/// Parse a `document.cookie` assignment (`name=value; Attr=...`)
///
/// Attributes absent from the string keep their browser defaults
/// (`Path=/`, no domain, not secure, `SameSite=Lax`).
pub fn parse_assignment(assignment: &str) -> Option<CookieAssignment> {
    let mut parts = assignment.split(';');
    let (name, raw_value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut attributes = CookieAttributes {
        secure: false,
        ..CookieAttributes::default()
    };

    for attr in parts {
        let attr = attr.trim();
        let (key, value) = match attr.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attr, ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" if !value.is_empty() => attributes.domain = Some(value.to_ascii_lowercase()),
            "path" if !value.is_empty() => attributes.path = value.to_string(),
            "secure" => attributes.secure = true,
            "samesite" => {
                if let Some(same_site) = SameSite::parse(value) {
                    attributes.same_site = same_site;
                }
            }
            "max-age" => attributes.max_age_secs = value.parse().ok(),
            _ => {}
        }
    }

    Some(CookieAssignment {
        name: name.to_string(),
        value: decode_value(raw_value.trim()),
        attributes,
    })
}

/// Find a cookie in a `document.cookie` read string (`a=1; b=2`)
pub fn find_cookie(cookie_string: &str, name: &str) -> Option<String> {
    cookie_string.split(';').find_map(|cookie| {
        let (key, value) = cookie.trim().split_once('=')?;

        if key == name {
            Some(decode_value(value))
        } else {
            None
        }
    })
}

/// RFC 6265 §5.1.3 domain match
///
/// `cookie_domain` may carry the legacy leading dot.
pub fn domain_matches(host: &str, cookie_domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Form-urlencode a cookie value
pub fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode_value(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_assignment() {
        let attrs = CookieAttributes {
            domain: Some(".example.com".to_string()),
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(3600),
        };

        let cookie = attrs.build_assignment("accessToken", "abc.def");
        assert!(cookie.starts_with("accessToken=abc.def"));
        assert!(cookie.contains("Domain=.example.com"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn test_parse_assignment() {
        let parsed =
            parse_assignment("token=a%3Bb; Domain=.Example.com; Path=/; Secure; SameSite=Strict")
                .unwrap();
        assert_eq!(parsed.name, "token");
        assert_eq!(parsed.value, "a;b");
        assert_eq!(parsed.attributes.domain.as_deref(), Some(".example.com"));
        assert!(parsed.attributes.secure);
        assert_eq!(parsed.attributes.same_site, SameSite::Strict);
        assert!(!parsed.is_removal());
    }

    #[test]
    fn test_removal_round_trips_as_removal() {
        let attrs = CookieAttributes::default();
        let parsed = parse_assignment(&attrs.build_removal("refreshToken")).unwrap();
        assert_eq!(parsed.name, "refreshToken");
        assert!(parsed.is_removal());
    }

    #[test]
    fn test_parse_assignment_rejects_garbage() {
        assert!(parse_assignment("no-equals-sign").is_none());
        assert!(parse_assignment("=value").is_none());
    }

    #[test]
    fn test_find_cookie() {
        let jar = "foo=bar; accessToken=abc123; other=x%20y";

        assert_eq!(find_cookie(jar, "accessToken"), Some("abc123".to_string()));
        assert_eq!(find_cookie(jar, "other"), Some("x y".to_string()));
        assert_eq!(find_cookie(jar, "missing"), None);
    }

    #[test]
    fn test_domain_matches() {
        assert!(domain_matches("shop.example.com", ".example.com"));
        assert!(domain_matches("example.com", ".example.com"));
        assert!(domain_matches("a.b.vercel.app", ".vercel.app"));
        assert!(!domain_matches("badexample.com", ".example.com"));
        assert!(!domain_matches("example.org", "example.com"));
        assert!(!domain_matches("example.com", "."));
    }
}
