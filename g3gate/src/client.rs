/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::str::FromStr;

use http::{HeaderMap, HeaderName};
use thiserror::Error;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

#[derive(Debug, Error)]
pub enum ClientAddrError {
    #[error("invalid forwarded header value")]
    InvalidForwardedHeader,
    #[error("unable to parse client address {0:?}")]
    InvalidAddress(String),
}

/// Resolve the originating client address for a request.
///
/// A non-empty `X-Forwarded-For` header takes precedence over the transport
/// peer address, and its first entry is trusted unconditionally. The peer
/// address may carry a port suffix, which is stripped. The returned address
/// is in canonical form, so IPv4-mapped IPv6 addresses collapse to IPv4.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer_addr: &str,
) -> Result<IpAddr, ClientAddrError> {
    if let Some(v) = headers.get(X_FORWARDED_FOR) {
        let value = v
            .to_str()
            .map_err(|_| ClientAddrError::InvalidForwardedHeader)?;
        if !value.is_empty() {
            let first = value.split(", ").next().unwrap_or(value);
            return parse_ip(first);
        }
    }

    parse_ip(strip_port(peer_addr))
}

/// Strip a port suffix in `host:port` or `[host]:port` form. The port part
/// is only stripped, never validated; a string without a port is returned
/// verbatim.
fn strip_port(peer: &str) -> &str {
    if let Some(r) = peer.strip_prefix('[') {
        if let Some((host, _)) = r.split_once(']') {
            return host;
        }
    } else if let Some((host, _)) = peer.rsplit_once(':') {
        if !host.contains(':') {
            return host;
        }
    }
    peer
}

fn parse_ip(s: &str) -> Result<IpAddr, ClientAddrError> {
    IpAddr::from_str(s)
        .map(|ip| ip.to_canonical())
        .map_err(|_| ClientAddrError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn forwarded_single() {
        let headers = forwarded("120.100.100.0");
        let ip = resolve_client_ip(&headers, "10.0.0.1:50422").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(120, 100, 100, 0)));
    }

    #[test]
    fn forwarded_chain_takes_first() {
        let headers = forwarded("203.0.113.7, 10.0.0.2, 10.0.0.3");
        let ip = resolve_client_ip(&headers, "10.0.0.1:50422").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
    }

    #[test]
    fn forwarded_invalid_entry() {
        let headers = forwarded("not-an-address, 10.0.0.2");
        assert!(resolve_client_ip(&headers, "10.0.0.1:50422").is_err());
    }

    #[test]
    fn forwarded_empty_falls_back_to_peer() {
        let headers = forwarded("");
        let ip = resolve_client_ip(&headers, "192.0.2.10:1234").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
    }

    #[test]
    fn peer_with_port() {
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "192.0.2.10:1234").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
    }

    #[test]
    fn peer_with_out_of_range_port() {
        // the port suffix is stripped without being validated
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "192.0.2.10:99999").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
    }

    #[test]
    fn peer_without_port() {
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "192.0.2.10").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
    }

    #[test]
    fn peer_v6_with_port() {
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "[2001:db8::1]:443").unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::from_str("2001:db8::1").unwrap()));
    }

    #[test]
    fn peer_v6_without_port() {
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "::1").unwrap();
        assert_eq!(ip, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn peer_v4_mapped_is_canonicalized() {
        let headers = HeaderMap::new();
        let ip = resolve_client_ip(&headers, "::ffff:192.0.2.10").unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)));
    }

    #[test]
    fn peer_invalid() {
        let headers = HeaderMap::new();
        assert!(resolve_client_ip(&headers, "example.net:80").is_err());
        assert!(resolve_client_ip(&headers, "").is_err());
    }
}
