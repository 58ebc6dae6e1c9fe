//! Locating the credential within a request.
//!
//! Precedence: `Authorization: Bearer <token>` (scheme matched
//! case-insensitively), then a query parameter, then a named cookie. The first
//! non-empty value wins.

use axum::http::{header, HeaderMap};
use url::form_urlencoded;

/// The parts of a request a credential can live in.
#[derive(Debug, Clone, Copy)]
pub struct TokenSources<'a> {
    pub headers: &'a HeaderMap,
    pub query: Option<&'a str>,
}

impl<'a> TokenSources<'a> {
    pub fn new(headers: &'a HeaderMap, query: Option<&'a str>) -> Self {
        Self { headers, query }
    }
}

pub fn locate_token(sources: &TokenSources<'_>, query_param: &str, cookie_name: &str) -> Option<String> {
    bearer_token(sources.headers)
        .or_else(|| sources.query.and_then(|q| query_value(q, query_param)))
        .or_else(|| cookie_value(sources.headers, cookie_name))
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
            if !scheme.eq_ignore_ascii_case("bearer") {
                return None;
            }
            non_empty(token)
        })
}

/// First non-empty value of `name` in a raw query string.
pub fn query_value(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == name)
        .find_map(|(_, value)| non_empty(&value))
}

/// Value of cookie `name` across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim() == name)
        .find_map(|(_, value)| non_empty(value.trim().trim_matches('"')))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["Bearer abc", "bearer abc", "BEARER   abc  "] {
            let map = headers(&[("authorization", value)]);
            assert_eq!(bearer_token(&map).as_deref(), Some("abc"), "{value}");
        }
    }

    #[test]
    fn test_other_schemes_ignored() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(bearer_token(&map), None);
        let map = headers(&[("authorization", "Bearer ")]);
        assert_eq!(bearer_token(&map), None);
    }

    #[test]
    fn test_query_value() {
        assert_eq!(query_value("a=1&token=xyz", "token").as_deref(), Some("xyz"));
        assert_eq!(query_value("token=&token=second", "token").as_deref(), Some("second"));
        assert_eq!(query_value("tok=xyz", "token"), None);
        assert_eq!(query_value("token=a%2Eb", "token").as_deref(), Some("a.b"));
    }

    #[test]
    fn test_cookie_value() {
        let map = headers(&[("cookie", "theme=dark; token=abc.def; lang=en")]);
        assert_eq!(cookie_value(&map, "token").as_deref(), Some("abc.def"));
        assert_eq!(cookie_value(&map, "session"), None);

        let map = headers(&[("cookie", "a=1"), ("cookie", "admin_token=\"q\"")]);
        assert_eq!(cookie_value(&map, "admin_token").as_deref(), Some("q"));
    }

    #[test]
    fn test_precedence() {
        let map = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "token=from-cookie"),
        ]);
        let sources = TokenSources::new(&map, Some("token=from-query"));
        assert_eq!(
            locate_token(&sources, "token", "token").as_deref(),
            Some("from-header")
        );

        let map = headers(&[("cookie", "token=from-cookie")]);
        let sources = TokenSources::new(&map, Some("token=from-query"));
        assert_eq!(
            locate_token(&sources, "token", "token").as_deref(),
            Some("from-query")
        );

        let sources = TokenSources::new(&map, Some("token="));
        assert_eq!(
            locate_token(&sources, "token", "token").as_deref(),
            Some("from-cookie")
        );

        let empty = HeaderMap::new();
        assert_eq!(locate_token(&TokenSources::new(&empty, None), "token", "token"), None);
    }
}
