//! JSON response envelope.
//!
//! # Responsibilities
//! - Serialize the body and force the security headers
//! - Propagate the correlation id (header first, then body `requestId`)
//! - Guarantee the id in error bodies
//! - Downgrade to a minimal 500 when serialization fails
//!
//! # Design Decisions
//! - Security headers are applied after caller headers, never merged
//! - A failed serialization never leaks a partial body or error detail
//! - Invalid status codes collapse to 500 before anything is built

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::http::request_id::{RequestId, X_REQUEST_ID};
use crate::security::headers::apply_security_headers;

/// Field carrying the correlation id inside JSON bodies.
pub const REQUEST_ID_FIELD: &str = "requestId";

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error.";

/// Coerce anything outside 100–599 to 500.
pub fn normalize_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if (100..=599).contains(&status) => code,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build a JSON response.
///
/// `extra_headers` are merged first; an `x-request-id` among them is kept
/// when it normalizes cleanly.
pub fn json_response<B>(body: &B, status: u16, extra_headers: Option<HeaderMap>) -> Response
where
    B: Serialize + ?Sized,
{
    let status = normalize_status(status);
    let mut headers = extra_headers.unwrap_or_default();

    let header_id = headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::parse);
    headers.remove(&X_REQUEST_ID);

    let mut value = match serde_json::to_value(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, request_id = ?header_id, "Response serialization failed");
            return serialization_failure(header_id.as_ref());
        }
    };

    let request_id = header_id.or_else(|| body_request_id(&value));

    if status.as_u16() >= 400 {
        if let (Some(id), Value::Object(map)) = (&request_id, &mut value) {
            map.entry(REQUEST_ID_FIELD)
                .or_insert_with(|| Value::String(id.as_str().to_owned()));
        }
    }

    let bytes = match serde_json::to_vec(&value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, request_id = ?request_id, "Response serialization failed");
            return serialization_failure(request_id.as_ref());
        }
    };

    build(status, headers, bytes, request_id.as_ref())
}

/// Error envelope `{"error": message, "code": code}` plus the request id.
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    request_id: Option<&RequestId>,
    extra_headers: Option<HeaderMap>,
) -> Response {
    let headers = with_request_id(extra_headers.unwrap_or_default(), request_id);
    json_response(
        &json!({ "error": message, "code": code }),
        status.as_u16(),
        Some(headers),
    )
}

/// Add `x-request-id` to a header map.
pub fn with_request_id(mut headers: HeaderMap, request_id: Option<&RequestId>) -> HeaderMap {
    if let Some(id) = request_id {
        headers.insert(X_REQUEST_ID, id.header_value());
    }
    headers
}

fn body_request_id(value: &Value) -> Option<RequestId> {
    value
        .get(REQUEST_ID_FIELD)
        .and_then(Value::as_str)
        .and_then(RequestId::parse)
}

fn serialization_failure(request_id: Option<&RequestId>) -> Response {
    let mut body = Map::new();
    body.insert("error".into(), Value::String(INTERNAL_ERROR_MESSAGE.into()));
    if let Some(id) = request_id {
        body.insert(REQUEST_ID_FIELD.into(), Value::String(id.as_str().to_owned()));
    }
    // A map of strings always serializes.
    let bytes = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());
    build(StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), bytes, request_id)
}

fn build(
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
    request_id: Option<&RequestId>,
) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;

    let mut headers = with_request_id(headers, request_id);
    apply_security_headers(&mut headers);
    *response.headers_mut() = headers;
    response
}
