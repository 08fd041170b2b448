//! Client identity resolution from untrusted proxy headers.
//!
//! # Resolution order
//! 1. `x-forwarded-for`, every line, left to right
//! 2. `forwarded` (RFC 7239) `for=` parameters, left to right
//! 3. Single-value edge headers in [`EDGE_IP_HEADERS`] order
//! 4. [`ANONYMOUS`]
//!
//! # Design Decisions
//! - Length and alphabet are checked on the raw token before any IP parsing
//! - Quotes, brackets, ports and IPv6 zone ids are stripped before validation
//! - Addresses are returned in canonical form so equal clients share a key

use std::net::{IpAddr, Ipv4Addr};

use axum::http::{HeaderMap, HeaderName};

/// Identity returned when no header carries a valid address.
pub const ANONYMOUS: &str = "anonymous";

/// Raw tokens longer than this are discarded unparsed.
pub const MAX_TOKEN_LEN: usize = 80;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const FORWARDED: HeaderName = HeaderName::from_static("forwarded");

/// Single-value client address headers set by common proxies and CDNs.
pub const EDGE_IP_HEADERS: &[&str] = &[
    "x-real-ip",
    "cf-connecting-ip",
    "true-client-ip",
    "x-client-ip",
    "fastly-client-ip",
    "fly-client-ip",
];

/// Resolve the best-effort client address, or [`ANONYMOUS`].
pub fn resolve_client_ip(headers: &HeaderMap) -> String {
    forwarded_for_candidates(headers)
        .chain(forwarded_candidates(headers))
        .chain(edge_candidates(headers))
        .find_map(normalize_ip_token)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

fn header_lines<'a>(headers: &'a HeaderMap, name: &HeaderName) -> impl Iterator<Item = &'a str> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
}

fn forwarded_for_candidates(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    header_lines(headers, &X_FORWARDED_FOR).flat_map(|line| line.split(','))
}

fn forwarded_candidates(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    header_lines(headers, &FORWARDED)
        .flat_map(|line| line.split(','))
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            key.trim().eq_ignore_ascii_case("for").then_some(value)
        })
}

fn edge_candidates(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    EDGE_IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
}

/// Normalize one candidate token into a validated address.
///
/// Returns `None` for tokens that are empty, too long, mention `unknown`,
/// contain characters outside the address alphabet, or fail IP parsing.
pub fn normalize_ip_token(raw: &str) -> Option<IpAddr> {
    let token = raw.trim();
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return None;
    }
    if !token.bytes().all(is_address_byte) {
        return None;
    }
    if token.to_ascii_lowercase().contains("unknown") {
        return None;
    }

    let token = strip_quotes(token).trim();
    let host = strip_port(token)?;
    let host = match host.split_once('%') {
        Some((address, _zone)) => address,
        None => host,
    };

    host.parse::<IpAddr>().ok()
}

fn is_address_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b':' | b'[' | b']' | b'%' | b'"' | b'_' | b'-')
}

fn strip_quotes(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(token)
}

/// Strip brackets and an optional port.
///
/// `[v6]` and `[v6]:port` lose their brackets; `v4:port` loses its port;
/// bare IPv6 (multiple colons) is left alone.
fn strip_port(token: &str) -> Option<&str> {
    if let Some(rest) = token.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        return match tail {
            "" => Some(host),
            _ => tail
                .strip_prefix(':')
                .filter(|port| is_port(port))
                .map(|_| host),
        };
    }

    match token.split_once(':') {
        Some((host, port)) if !port.contains(':') => {
            // Only an IPv4 literal may carry an unbracketed port.
            host.parse::<Ipv4Addr>().ok()?;
            is_port(port).then_some(host)
        }
        _ => Some(token),
    }
}

fn is_port(port: &str) -> bool {
    !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit())
}
