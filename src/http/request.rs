//! JSON request ingestion.
//!
//! # Pipeline
//! ```text
//! content-length syntax → content-type → declared size
//!     → bounded stream read → strict UTF-8 (BOM stripped)
//!     → declared length == received bytes → non-empty
//!     → character budget → JSON syntax → schema (serde + validator)
//! ```
//!
//! # Design Decisions
//! - Each stage fails with its own typed error; nothing panics or throws
//! - Client-facing messages are generic; details only reach debug logs
//! - The body stream is owned by the reader and dropped on every exit

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::http::request_id::RequestId;
use crate::http::response::error_response;
use crate::security::limits::{
    check_content_type, check_declared_size, declared_content_length, TransportError,
};

const BOM: char = '\u{FEFF}';

/// Per-route ingestion limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Byte budget for the raw body.
    pub max_bytes: Option<usize>,
    /// Budget in Unicode scalar values for the decoded body.
    pub max_chars: Option<usize>,
    /// Reject requests without a content-type header.
    pub require_content_type: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_bytes: Some(64 * 1024),
            max_chars: None,
            require_content_type: true,
        }
    }
}

/// Why a bounded body read stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body stream failed")]
    Stream,
}

impl From<ReadError> for TransportError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::TooLarge { limit } => TransportError::PayloadTooLarge { limit },
            ReadError::Stream => TransportError::Stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("body is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("body is empty")]
    Empty,

    #[error("body exceeds {limit} characters")]
    TooManyCharacters { limit: usize },

    #[error("body is not valid JSON")]
    InvalidJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("payload does not match the schema")]
    InvalidPayload,
}

/// A request rejected by the ingestion pipeline, tagged by stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestRejection {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl IngestRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestRejection::Transport(e) => e.status(),
            IngestRejection::Structural(StructuralError::TooManyCharacters { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            IngestRejection::Encoding(_)
            | IngestRejection::Structural(_)
            | IngestRejection::Semantic(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            IngestRejection::Transport(e) => match e {
                TransportError::InvalidContentLength => "INVALID_CONTENT_LENGTH",
                TransportError::AmbiguousContentType
                | TransportError::UnsupportedContentType
                | TransportError::MissingContentType => "UNSUPPORTED_MEDIA_TYPE",
                TransportError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
                TransportError::Stream => "BODY_READ_FAILED",
                TransportError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            },
            IngestRejection::Encoding(EncodingError::InvalidUtf8) => "INVALID_ENCODING",
            IngestRejection::Structural(e) => match e {
                StructuralError::Empty => "EMPTY_BODY",
                StructuralError::TooManyCharacters { .. } => "PAYLOAD_TOO_LARGE",
                StructuralError::InvalidJson => "INVALID_JSON",
            },
            IngestRejection::Semantic(SemanticError::InvalidPayload) => "INVALID_PAYLOAD",
        }
    }

    /// Generic message safe to show to any client.
    pub fn public_message(&self) -> &'static str {
        match self {
            IngestRejection::Transport(e) => match e {
                TransportError::InvalidContentLength => "Invalid Content-Length header.",
                TransportError::AmbiguousContentType
                | TransportError::UnsupportedContentType
                | TransportError::MissingContentType => {
                    "Unsupported content type. Expected application/json."
                }
                TransportError::PayloadTooLarge { .. } => "Request body too large.",
                TransportError::Stream => "Unable to read request body.",
                TransportError::LengthMismatch { .. } => "Request body length mismatch.",
            },
            IngestRejection::Encoding(_) => "Request body must be valid UTF-8.",
            IngestRejection::Structural(e) => match e {
                StructuralError::Empty => "Request body is empty.",
                StructuralError::TooManyCharacters { .. } => "Request body too large.",
                StructuralError::InvalidJson => "Invalid JSON.",
            },
            IngestRejection::Semantic(_) => "Invalid payload.",
        }
    }

    /// Ready-to-send error envelope.
    pub fn to_response(&self, request_id: Option<&RequestId>) -> Response {
        error_response(self.status(), self.code(), self.public_message(), request_id, None)
    }
}

/// Read a body, aborting as soon as more than `max_bytes` have arrived.
pub async fn read_body_limited(body: Body, max_bytes: Option<usize>) -> Result<Bytes, ReadError> {
    let mut stream = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut total: usize = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::debug!(error = %e, "Body stream error");
            ReadError::Stream
        })?;
        total = total.saturating_add(chunk.len());
        if let Some(limit) = max_bytes {
            if total > limit {
                return Err(ReadError::TooLarge { limit });
            }
        }
        chunks.push(chunk);
    }

    if chunks.len() == 1 {
        return Ok(chunks.pop().unwrap_or_default());
    }
    let mut buffer = BytesMut::with_capacity(total);
    for chunk in chunks {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Strict UTF-8 decode with a leading byte-order mark removed.
pub fn decode_utf8(bytes: &[u8]) -> Result<&str, EncodingError> {
    let text = std::str::from_utf8(bytes).map_err(|_| EncodingError::InvalidUtf8)?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}

/// Run the full pipeline on a request.
pub async fn parse_json_request<T>(
    request: Request,
    options: &ReadOptions,
) -> Result<T, IngestRejection>
where
    T: DeserializeOwned + Validate,
{
    let (parts, body) = request.into_parts();
    parse_json_body(&parts.headers, body, options).await
}

/// Run the full pipeline on headers and a body taken apart by the caller.
pub async fn parse_json_body<T>(
    headers: &HeaderMap,
    body: Body,
    options: &ReadOptions,
) -> Result<T, IngestRejection>
where
    T: DeserializeOwned + Validate,
{
    let declared = declared_content_length(headers)?;
    check_content_type(headers, options.require_content_type)?;
    check_declared_size(declared, options.max_bytes)?;

    let bytes = read_body_limited(body, options.max_bytes)
        .await
        .map_err(TransportError::from)?;

    let text = decode_utf8(&bytes)?;

    if let Some(declared) = declared {
        let received = bytes.len() as u64;
        if received != declared {
            return Err(TransportError::LengthMismatch { declared, received }.into());
        }
    }

    if text.trim().is_empty() {
        return Err(StructuralError::Empty.into());
    }

    if let Some(limit) = options.max_chars {
        if text.chars().count() > limit {
            return Err(StructuralError::TooManyCharacters { limit }.into());
        }
    }

    let value: Value = serde_json::from_str(text).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed JSON");
        StructuralError::InvalidJson
    })?;

    validate_value(value)
}

/// Deserialize an already-parsed value into `T` and run its validation rules.
pub fn validate_value<T>(value: Value) -> Result<T, IngestRejection>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Payload shape mismatch");
        SemanticError::InvalidPayload
    })?;

    payload.validate().map_err(|e| {
        tracing::debug!(errors = %e, "Payload validation failed");
        SemanticError::InvalidPayload
    })?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate, PartialEq)]
    struct Note {
        #[validate(length(min = 1, max = 10))]
        title: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn json_headers(length: Option<usize>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(length) = length {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        }
        headers
    }

    fn options(max_bytes: usize) -> ReadOptions {
        ReadOptions {
            max_bytes: Some(max_bytes),
            max_chars: None,
            require_content_type: true,
        }
    }

    async fn parse(
        headers: HeaderMap,
        body: impl Into<Body>,
        opts: ReadOptions,
    ) -> Result<Note, IngestRejection> {
        parse_json_body::<Note>(&headers, body.into(), &opts).await
    }

    fn chunked(parts: Vec<&'static [u8]>) -> Body {
        let stream = futures_util::stream::iter(
            parts
                .into_iter()
                .map(|p| Ok::<_, std::io::Error>(Bytes::from_static(p))),
        );
        Body::from_stream(stream)
    }

    #[tokio::test]
    async fn test_well_formed_request_round_trips() {
        let body = r#"{"title":"hello","tags":["a","b"]}"#;
        let note = parse(json_headers(Some(body.len())), body, options(1024)).await.unwrap();
        assert_eq!(
            note,
            Note {
                title: "hello".into(),
                tags: vec!["a".into(), "b".into()]
            }
        );
    }

    #[tokio::test]
    async fn test_exact_byte_budget() {
        let body = r#"{"title":"abc"}"#;
        let limit = body.len();
        assert!(parse(json_headers(None), body, options(limit)).await.is_ok());

        let over = r#"{"title":"abcd"}"#;
        assert_eq!(
            parse(json_headers(None), over, options(limit)).await,
            Err(TransportError::PayloadTooLarge { limit }.into())
        );
    }

    #[tokio::test]
    async fn test_declared_oversize_rejected_before_read() {
        let err = parse(json_headers(Some(5000)), "{}", options(100)).await.unwrap_err();
        assert_eq!(err, TransportError::PayloadTooLarge { limit: 100 }.into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_understated_length_still_bounded_by_stream() {
        let body = chunked(vec![b"{\"title\":", b"\"0123456789\"", b"}"]);
        let err = parse(json_headers(Some(2)), body, options(16)).await.unwrap_err();
        assert_eq!(err, TransportError::PayloadTooLarge { limit: 16 }.into());
    }

    #[tokio::test]
    async fn test_chunks_are_concatenated() {
        let body = chunked(vec![b"{\"ti", b"tle\":\"", b"x\"}"]);
        let note = parse(json_headers(None), body, options(64)).await.unwrap();
        assert_eq!(note.title, "x");
    }

    #[tokio::test]
    async fn test_stream_error_is_rejected() {
        let stream = futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"{\"title\"")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let err = parse(json_headers(None), Body::from_stream(stream), options(64))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Stream.into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_length_mismatch() {
        let body = r#"{"title":"abc"}"#;
        for declared in [body.len() - 1, body.len() + 1] {
            let err = parse(json_headers(Some(declared)), body, options(1024)).await.unwrap_err();
            assert_eq!(
                err,
                TransportError::LengthMismatch {
                    declared: declared as u64,
                    received: body.len() as u64
                }
                .into()
            );
            assert_eq!(err.code(), "LENGTH_MISMATCH");
        }
    }

    #[tokio::test]
    async fn test_invalid_content_length_rejected() {
        let mut headers = json_headers(None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("ten"));
        let err = parse(headers, "{}", options(1024)).await.unwrap_err();
        assert_eq!(err, TransportError::InvalidContentLength.into());
    }

    #[tokio::test]
    async fn test_content_type_rules() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json, text/plain"),
        );
        let err = parse(headers, r#"{"title":"a"}"#, options(64)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let err = parse(HeaderMap::new(), r#"{"title":"a"}"#, options(64)).await.unwrap_err();
        assert_eq!(err, TransportError::MissingContentType.into());

        let lenient = ReadOptions {
            require_content_type: false,
            ..options(64)
        };
        assert!(parse(HeaderMap::new(), r#"{"title":"a"}"#, lenient).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let body: &'static [u8] = b"{\"title\":\"\xff\xfe\"}";
        let err = parse(json_headers(None), Body::from(body), options(64)).await.unwrap_err();
        assert_eq!(err, EncodingError::InvalidUtf8.into());
    }

    #[tokio::test]
    async fn test_bom_is_stripped() {
        let plain = r#"{"title":"bom"}"#;
        let with_bom = format!("\u{FEFF}{plain}");

        let a = parse(json_headers(Some(plain.len())), plain, options(64)).await.unwrap();
        let b = parse(json_headers(Some(with_bom.len())), with_bom, options(64)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_bom_only_body_is_empty() {
        let err = parse(json_headers(None), "\u{FEFF}", options(64)).await.unwrap_err();
        assert_eq!(err, StructuralError::Empty.into());
    }

    #[tokio::test]
    async fn test_empty_and_whitespace_bodies() {
        for body in ["", "   \n\t "] {
            let err = parse(json_headers(None), body, options(64)).await.unwrap_err();
            assert_eq!(err, StructuralError::Empty.into());
            assert_eq!(err.public_message(), "Request body is empty.");
        }
    }

    #[tokio::test]
    async fn test_character_budget() {
        let body = r#"{"title":"ééééé"}"#;
        let chars = body.chars().count();
        let opts = ReadOptions {
            max_chars: Some(chars),
            ..options(1024)
        };
        assert!(parse(json_headers(None), body, opts).await.is_ok());

        let opts = ReadOptions {
            max_chars: Some(chars - 1),
            ..options(1024)
        };
        let err = parse(json_headers(None), body, opts).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_invalid_json_is_generic() {
        let err = parse(json_headers(None), "{\"title\": ", options(64)).await.unwrap_err();
        assert_eq!(err, StructuralError::InvalidJson.into());
        assert_eq!(err.public_message(), "Invalid JSON.");
    }

    #[tokio::test]
    async fn test_schema_violations_collapse() {
        for body in [
            r#"{"title":""}"#,
            r#"{"title":"far too long for this"}"#,
            r#"{"title":5}"#,
            r#"{"tags":[]}"#,
            r#"[1,2,3]"#,
        ] {
            let err = parse(json_headers(None), body, options(128)).await.unwrap_err();
            assert_eq!(err, SemanticError::InvalidPayload.into(), "{body}");
            assert_eq!(err.public_message(), "Invalid payload.");
        }
    }

    #[tokio::test]
    async fn test_rejection_response() {
        let id = RequestId::parse("req-9");
        let response = IngestRejection::from(StructuralError::InvalidJson).to_response(id.as_ref());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "error": "Invalid JSON.",
                "code": "INVALID_JSON",
                "requestId": "req-9",
            })
        );
    }

    #[tokio::test]
    async fn test_parse_json_request_from_full_request() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"req"}"#))
            .unwrap();
        let note: Note = parse_json_request(request, &options(64)).await.unwrap();
        assert_eq!(note.title, "req");
    }
}
