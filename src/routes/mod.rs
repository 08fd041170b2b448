//! API route handlers.
//!
//! # Data Flow
//! ```text
//! Request (x-request-id already attached)
//!     → admit: client identity → rate limiter → JSON reader/validator
//!     → collaborator (chat / mail / recommend)
//!     → json_response envelope
//!     → finish: metrics
//! ```

pub mod backends;
pub mod chat;
pub mod contact;
pub mod health;
pub mod recommend;

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::config::{RoutePolicy, RoutesConfig};
use crate::http::request::parse_json_request;
use crate::http::request_id::RequestId;
use crate::http::response::error_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::{resolve_client_ip, RateLimitKey};

pub use backends::{Backends, ChatBackend, CollaboratorError, MailBackend, RecommendBackend};

pub const RATE_LIMITED_CODE: &str = "RATE_LIMITED";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

/// Rate-limited API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Chat,
    Contact,
    Recommend,
}

impl Route {
    /// Limiter namespace and metrics label.
    pub fn namespace(self) -> &'static str {
        match self {
            Route::Chat => "chat",
            Route::Contact => "contact",
            Route::Recommend => "recommend",
        }
    }

    pub fn policy(self, routes: &RoutesConfig) -> &RoutePolicy {
        match self {
            Route::Chat => &routes.chat,
            Route::Contact => &routes.contact,
            Route::Recommend => &routes.recommend,
        }
    }
}

/// Identity, rate limit and body checks shared by every API route.
///
/// Rate limiting runs before the body is touched, so rejected clients
/// never cost a read.
pub async fn admit<T>(
    state: &AppState,
    route: Route,
    request_id: &RequestId,
    request: Request,
) -> Result<T, Response>
where
    T: DeserializeOwned + Validate,
{
    let policy = route.policy(&state.routes.load()).clone();
    let client = resolve_client_ip(request.headers());
    let key = RateLimitKey::new(route.namespace(), &client);

    let decision = state.limiter.check(&key, policy.rate_limit_rule());
    if !decision.success {
        tracing::warn!(
            request_id = %request_id,
            route = route.namespace(),
            client = %client,
            retry_after = decision.retry_after_secs(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited(route.namespace());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(decision.retry_after_secs()),
        );
        return Err(error_response(
            StatusCode::TOO_MANY_REQUESTS,
            RATE_LIMITED_CODE,
            RATE_LIMITED_MESSAGE,
            Some(request_id),
            Some(headers),
        ));
    }

    parse_json_request::<T>(request, &policy.read_options())
        .await
        .map_err(|rejection| {
            tracing::debug!(
                request_id = %request_id,
                route = route.namespace(),
                client = %client,
                reason = rejection.code(),
                error = %rejection,
                "Request rejected"
            );
            metrics::record_rejection(route.namespace(), rejection.code());
            rejection.to_response(Some(request_id))
        })
}

/// Record the outcome of a handled request.
pub fn finish(route: Route, started: Instant, response: Response) -> Response {
    metrics::record_request(route.namespace(), response.status().as_u16(), started);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_distinct() {
        let names = [Route::Chat, Route::Contact, Route::Recommend].map(Route::namespace);
        assert_eq!(names, ["chat", "contact", "recommend"]);
    }

    #[test]
    fn test_policy_lookup() {
        let routes = RoutesConfig::default();
        assert_eq!(Route::Chat.policy(&routes).max_requests, 50);
        assert_eq!(Route::Contact.policy(&routes).max_requests, 5);
        assert_eq!(Route::Recommend.policy(&routes).max_requests, 40);
    }
}
