//! Transport metadata checks applied before a body is read.
//!
//! # Responsibilities
//! - Parse and validate `content-length`
//! - Accept only a single JSON-family `content-type`
//! - Reject declared sizes above the byte budget without touching the body
//!
//! # Design Decisions
//! - Header values are bounded and charset-checked before any parsing
//! - Repeated or comma-joined content types are ambiguous and rejected
//! - Failures are typed; the caller decides how they become responses

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use thiserror::Error;

/// Content-type values longer than this are rejected unparsed.
pub const MAX_CONTENT_TYPE_LEN: usize = 256;

/// Framing and metadata problems detected before or while reading a body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("content-length is not a valid non-negative integer")]
    InvalidContentLength,

    #[error("content-type lists more than one media type")]
    AmbiguousContentType,

    #[error("content-type is not a JSON media type")]
    UnsupportedContentType,

    #[error("content-type header is required")]
    MissingContentType,

    #[error("body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("body stream failed")]
    Stream,

    #[error("received {received} bytes but content-length declared {declared}")]
    LengthMismatch { declared: u64, received: u64 },
}

impl TransportError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransportError::AmbiguousContentType
            | TransportError::UnsupportedContentType
            | TransportError::MissingContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            TransportError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            TransportError::InvalidContentLength
            | TransportError::Stream
            | TransportError::LengthMismatch { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Parse the declared body length.
///
/// Repeated headers are accepted only when every value is identical.
pub fn declared_content_length(headers: &HeaderMap) -> Result<Option<u64>, TransportError> {
    let mut declared: Option<u64> = None;
    for value in headers.get_all(header::CONTENT_LENGTH) {
        let parsed = parse_content_length(value)?;
        match declared {
            Some(previous) if previous != parsed => {
                return Err(TransportError::InvalidContentLength)
            }
            _ => declared = Some(parsed),
        }
    }
    Ok(declared)
}

fn parse_content_length(value: &HeaderValue) -> Result<u64, TransportError> {
    let text = value
        .to_str()
        .map_err(|_| TransportError::InvalidContentLength)?
        .trim();
    // u64 has at most 20 digits; anything longer cannot be exact.
    if text.is_empty() || text.len() > 20 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransportError::InvalidContentLength);
    }
    text.parse::<u64>()
        .map_err(|_| TransportError::InvalidContentLength)
}

/// Require a single JSON-family media type, optionally with parameters.
pub fn check_content_type(headers: &HeaderMap, required: bool) -> Result<(), TransportError> {
    let mut values = headers.get_all(header::CONTENT_TYPE).iter();
    let Some(value) = values.next() else {
        return if required {
            Err(TransportError::MissingContentType)
        } else {
            Ok(())
        };
    };
    if values.next().is_some() {
        return Err(TransportError::AmbiguousContentType);
    }

    if value.len() > MAX_CONTENT_TYPE_LEN {
        return Err(TransportError::UnsupportedContentType);
    }
    // Visible ASCII only.
    let text = value
        .to_str()
        .map_err(|_| TransportError::UnsupportedContentType)?;
    if text.contains(',') {
        return Err(TransportError::AmbiguousContentType);
    }

    let media_type = text.split(';').next().unwrap_or_default().trim();
    if is_json_media_type(media_type) {
        Ok(())
    } else {
        Err(TransportError::UnsupportedContentType)
    }
}

/// `application/json` or `application/<subtype>+json`, case-insensitive.
fn is_json_media_type(media_type: &str) -> bool {
    let lowered = media_type.to_ascii_lowercase();
    let Some(subtype) = lowered.strip_prefix("application/") else {
        return false;
    };
    if subtype == "json" {
        return true;
    }
    match subtype.strip_suffix("+json") {
        Some(prefix) => !prefix.is_empty() && prefix.bytes().all(is_token_byte),
        None => false,
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'!' | b'#' | b'$' | b'&' | b'-' | b'^' | b'_' | b'.' | b'+')
}

/// Reject a declared length above the byte budget.
pub fn check_declared_size(
    declared: Option<u64>,
    max_bytes: Option<usize>,
) -> Result<(), TransportError> {
    match (declared, max_bytes) {
        (Some(length), Some(limit)) if length > limit as u64 => {
            Err(TransportError::PayloadTooLarge { limit })
        }
        _ => Ok(()),
    }
}
