//! Correlation identifiers.
//!
//! # Responsibilities
//! - Normalize untrusted ids from headers or bodies into a safe token
//! - Generate a UUID v4 when the client sent none
//! - Attach the id to the request (extension + header) and the response
//!
//! # Design Decisions
//! - Control and bidirectional-formatting characters are stripped, not escaped
//! - Ids are capped at [`MAX_REQUEST_ID_LEN`] characters of `[A-Za-z0-9._:-]`

use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub const MAX_REQUEST_ID_LEN: usize = 128;

/// A normalized correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Normalize an untrusted id; `None` if nothing safe remains.
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_request_id(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> HeaderValue {
        // Normalized ids are plain ASCII tokens.
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')
}

/// Strip control and bidi characters, trim, cap the length, and require
/// the remainder to be a non-empty safe token.
pub fn normalize_request_id(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !is_bidi_control(*c))
        .collect();
    let normalized: String = cleaned.trim().chars().take(MAX_REQUEST_ID_LEN).collect();

    if !normalized.is_empty() && normalized.chars().all(is_token_char) {
        Some(normalized)
    } else {
        None
    }
}

/// Adopt or generate the request id and echo it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_else(RequestId::generate);

    request
        .headers_mut()
        .insert(X_REQUEST_ID, request_id.header_value());
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if !response.headers().contains_key(&X_REQUEST_ID) {
        response
            .headers_mut()
            .insert(X_REQUEST_ID, request_id.header_value());
    }
    response
}
