//! Client identity for rate limiting.
//!
//! # Responsibilities
//! - Walk proxy/CDN headers in priority order, first usable value wins
//! - Parse `X-Forwarded-For` lists and RFC 7239 `Forwarded: for=`
//! - Strip ports, brackets and quotes the same way for every source
//! - Fall back to the socket peer, then to a constant key
//!
//! # Design Decisions
//! - Never fails: an unidentifiable client shares one global bucket rather
//!   than bypassing the limiter

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

/// Key used when neither headers nor the socket identify the client.
pub const FALLBACK_KEY: &str = "unidentified-client";

/// Consulted in this order.
pub const CLIENT_IP_HEADERS: [&str; 7] = [
    "cf-connecting-ip",
    "true-client-ip",
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "x-forwarded",
    "forwarded",
];

/// Rate-limit key for a request.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| {
            headers
                .get_all(*name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(|v| from_header(name, v))
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| FALLBACK_KEY.to_string())
}

fn from_header(name: &str, value: &str) -> Option<String> {
    match name {
        "forwarded" => forwarded_for(value),
        "x-forwarded" if value.to_ascii_lowercase().contains("for=") => forwarded_for(value),
        _ => first_valid(value),
    }
}

/// First valid host in a comma-separated list.
fn first_valid(value: &str) -> Option<String> {
    value.split(',').find_map(normalize_host)
}

/// First valid `for=` node in an RFC 7239 `Forwarded` value.
fn forwarded_for(value: &str) -> Option<String> {
    value
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("for"))
        .find_map(|(_, node)| normalize_host(node))
}

/// Strip quotes, brackets and ports; reject anything that is not a host.
fn normalize_host(raw: &str) -> Option<String> {
    let mut host = raw.trim().trim_matches('"').trim();

    if let Some(rest) = host.strip_prefix('[') {
        // [v6] or [v6]:port
        host = rest.split(']').next().unwrap_or_default();
    } else if host.matches(':').count() == 1 {
        // v4:port or name:port; bare v6 has several colons and is left alone
        host = host.split(':').next().unwrap_or_default();
    }

    if host.is_empty() || host.eq_ignore_ascii_case("unknown") {
        return None;
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip.to_string());
    }
    is_host_token(host).then(|| host.to_ascii_lowercase())
}

/// Hostnames and RFC 7239 obfuscated identifiers (`_hidden`).
fn is_host_token(host: &str) -> bool {
    host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
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

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:51234".parse().unwrap())
    }

    #[test]
    fn test_header_priority() {
        let map = headers(&[
            ("forwarded", "for=198.51.100.1"),
            ("x-forwarded-for", "203.0.113.7"),
            ("cf-connecting-ip", "192.0.2.44"),
        ]);
        assert_eq!(client_key(&map, peer()), "192.0.2.44");

        let map = headers(&[
            ("forwarded", "for=198.51.100.1"),
            ("x-real-ip", "203.0.113.8"),
        ]);
        assert_eq!(client_key(&map, peer()), "203.0.113.8");
    }

    #[test]
    fn test_forwarded_for_takes_first_valid() {
        let map = headers(&[("x-forwarded-for", "unknown, garbage!, 203.0.113.7:8080, 10.0.0.1")]);
        assert_eq!(client_key(&map, peer()), "203.0.113.7");
    }

    #[test]
    fn test_rfc7239_forwarded() {
        let map = headers(&[(
            "forwarded",
            "proto=https;for=\"[2001:db8::17]:4711\";by=203.0.113.43, for=198.51.100.2",
        )]);
        assert_eq!(client_key(&map, peer()), "2001:db8::17");

        let map = headers(&[("forwarded", "For=192.0.2.60;proto=http")]);
        assert_eq!(client_key(&map, peer()), "192.0.2.60");
    }

    #[test]
    fn test_x_forwarded_both_styles() {
        let map = headers(&[("x-forwarded", "for=192.0.2.61")]);
        assert_eq!(client_key(&map, peer()), "192.0.2.61");

        let map = headers(&[("x-forwarded", "192.0.2.62, 10.0.0.1")]);
        assert_eq!(client_key(&map, peer()), "192.0.2.62");
    }

    #[test]
    fn test_strip_uniformly() {
        assert_eq!(normalize_host(" \"192.0.2.1:443\" ").as_deref(), Some("192.0.2.1"));
        assert_eq!(normalize_host("[::1]").as_deref(), Some("::1"));
        assert_eq!(normalize_host("2001:db8::1").as_deref(), Some("2001:db8::1"));
        assert_eq!(normalize_host("Edge-Node_1:80").as_deref(), Some("edge-node_1"));
        assert_eq!(normalize_host("unknown"), None);
        assert_eq!(normalize_host(""), None);
        assert_eq!(normalize_host("a b"), None);
    }

    #[test]
    fn test_peer_then_fallback() {
        assert_eq!(client_key(&HeaderMap::new(), peer()), "10.0.0.9");
        assert_eq!(client_key(&HeaderMap::new(), None), FALLBACK_KEY);

        let map = headers(&[("x-forwarded-for", "unknown")]);
        assert_eq!(client_key(&map, peer()), "10.0.0.9");
    }
}
