//! Liveness probe and router fallbacks.

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Extension,
};
use serde_json::json;

use crate::http::request_id::RequestId;
use crate::http::response::{error_response, json_response, with_request_id};

/// `GET /health`
pub async fn health(Extension(request_id): Extension<RequestId>) -> Response {
    json_response(
        &json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        StatusCode::OK.as_u16(),
        Some(with_request_id(HeaderMap::new(), Some(&request_id))),
    )
}

pub async fn not_found(Extension(request_id): Extension<RequestId>) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "Not found.",
        Some(&request_id),
        None,
    )
}

pub async fn method_not_allowed(Extension(request_id): Extension<RequestId>) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        "Method not allowed.",
        Some(&request_id),
        None,
    )
}

/// Give the timeout layer's bare 408 the JSON error envelope.
pub async fn request_timeout(
    Extension(request_id): Extension<RequestId>,
    response: Response,
) -> Response {
    let bare = response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE);
    if !bare {
        return response;
    }

    tracing::warn!(request_id = %request_id, "Request timed out");
    error_response(
        StatusCode::REQUEST_TIMEOUT,
        "REQUEST_TIMEOUT",
        "Request timed out.",
        Some(&request_id),
        None,
    )
}
