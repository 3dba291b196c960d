//! URL and origin helpers
//!
//! Thin helpers over [`url::Url`] for the things a browser page does with
//! its location: validating absolute URLs, comparing origins, and reading,
//! adding or removing a single query parameter.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Not a valid absolute URL: {0}")]
    Invalid(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Parse an absolute `http`/`https` URL with a host
pub fn parse_absolute(raw: &str) -> Result<Url, LocationError> {
    let url = Url::parse(raw.trim()).map_err(|_| LocationError::Invalid(raw.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(LocationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(LocationError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// Scheme + host + port equality
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// `https://host[:port]`
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Resolve a route (`/dashboard`) against the origin of `base`
pub fn join_route(base: &Url, route: &str) -> Result<Url, LocationError> {
    let origin = origin_of(base);
    Url::parse(&origin)
        .and_then(|origin| origin.join(route))
        .map_err(|_| LocationError::Invalid(format!("{}{}", origin, route)))
}

/// First value of a query parameter, percent-decoded
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Append a query parameter, keeping the existing ones
pub fn with_query_param(url: &Url, name: &str, value: &str) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair(name, value);
    url
}

/// Remove every occurrence of a query parameter, keeping the rest
pub fn without_query_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = url.clone();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        assert!(parse_absolute("https://shop.example.com/dashboard").is_ok());
        assert!(parse_absolute("http://localhost:3000").is_ok());
        assert!(matches!(
            parse_absolute("/dashboard"),
            Err(LocationError::Invalid(_))
        ));
        assert!(matches!(
            parse_absolute("javascript:alert(1)"),
            Err(LocationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_absolute("ftp://example.com"),
            Err(LocationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("http://localhost:3001/login").unwrap();
        let b = Url::parse("http://localhost:3001/dashboard?x=1").unwrap();
        let c = Url::parse("http://localhost:3002/dashboard").unwrap();
        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &c));
        assert_eq!(origin_of(&c), "http://localhost:3002");
    }

    #[test]
    fn test_join_route_drops_path_and_query() {
        let base = Url::parse("https://shop.example.com/products?page=2").unwrap();
        let joined = join_route(&base, "/dashboard").unwrap();
        assert_eq!(joined.as_str(), "https://shop.example.com/dashboard");
    }

    #[test]
    fn test_query_param_round_trip() {
        let base = Url::parse("https://shop.example.com/dashboard?tab=orders").unwrap();
        let json = r#"{"a":"b c&d"}"#;
        let with = with_query_param(&base, "authToken", json);

        assert_eq!(query_param(&with, "authToken").as_deref(), Some(json));
        assert_eq!(query_param(&with, "tab").as_deref(), Some("orders"));

        let without = without_query_param(&with, "authToken");
        assert_eq!(query_param(&without, "authToken"), None);
        assert_eq!(without.as_str(), "https://shop.example.com/dashboard?tab=orders");
    }

    #[test]
    fn test_without_last_param_removes_question_mark() {
        let url = Url::parse("https://shop.example.com/dashboard?authToken=x#top").unwrap();
        let stripped = without_query_param(&url, "authToken");
        assert_eq!(stripped.as_str(), "https://shop.example.com/dashboard#top");
    }
}
