//! Fixed security headers for JSON API responses.
//!
//! # Design Decisions
//! - Applied last, after caller headers are merged, so they cannot be weakened
//! - Values are static; nothing here is configurable

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const NO_STORE: &str = "no-store";
pub const NOSNIFF: &str = "nosniff";

/// Header/value pairs every API response carries.
pub fn security_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
        (header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE)),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF)),
    ]
}

/// Overwrite the security headers, dropping any other values for them.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in security_headers() {
        headers.insert(name, value);
    }
}
