//! Client network address observation.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use knock_types::NetworkAddress;

/// Header set by the fronting proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Work out the public address a request came from.
///
/// With `trust_forwarded_for`, the first entry of `X-Forwarded-For` wins;
/// otherwise, or when the header is absent or empty, the TCP peer is used.
/// Whatever is picked is normalised (`::ffff:` prefix stripped) but not
/// otherwise validated.
pub fn observe_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Option<NetworkAddress> {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(first) = forwarded {
            return Some(NetworkAddress::normalized(first));
        }
    }
    peer.map(|p| NetworkAddress::normalized(&p.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(xff: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(FORWARDED_FOR, HeaderValue::from_str(xff).unwrap());
        h
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:5555".parse().unwrap())
    }

    #[test]
    fn first_forwarded_entry_wins() {
        let got = observe_address(&headers("203.0.113.5, 10.0.0.1, 10.0.0.2"), peer(), true);
        assert_eq!(got, Some(NetworkAddress::new("203.0.113.5")));
    }

    #[test]
    fn forwarded_header_ignored_when_untrusted() {
        let got = observe_address(&headers("203.0.113.5"), peer(), false);
        assert_eq!(got, Some(NetworkAddress::new("10.0.0.9")));
    }

    #[test]
    fn empty_header_falls_back_to_peer() {
        let got = observe_address(&headers(" , 1.1.1.1"), peer(), true);
        assert_eq!(got, Some(NetworkAddress::new("10.0.0.9")));
    }

    #[test]
    fn mapped_ipv4_peer_is_normalized() {
        let mapped: SocketAddr = "[::ffff:192.0.2.1]:80".parse().unwrap();
        let got = observe_address(&HeaderMap::new(), Some(mapped), true);
        assert_eq!(got, Some(NetworkAddress::new("192.0.2.1")));
    }

    #[test]
    fn nothing_observable() {
        assert_eq!(observe_address(&HeaderMap::new(), None, true), None);
    }
}
