//! `POST /api/contact`

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::http::request_id::RequestId;
use crate::http::response::{json_response, with_request_id};
use crate::http::server::AppState;
use crate::routes::{admit, finish, Route};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email, length(max = 254))]
    pub email: String,

    #[validate(length(min = 10, max = 5000))]
    pub message: String,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub company: Option<String>,
}

pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    request: Request,
) -> Response {
    let started = Instant::now();
    let admitted = admit::<ContactRequest>(&state, Route::Contact, &request_id, request).await;
    let response = match admitted {
        Ok(message) => match state.backends.mail.deliver(&message).await {
            Ok(()) => {
                tracing::info!(request_id = %request_id, "Contact message delivered");
                json_response(
                    &json!({ "ok": true, "requestId": request_id.as_str() }),
                    StatusCode::OK.as_u16(),
                    Some(with_request_id(Default::default(), Some(&request_id))),
                )
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Mail backend failed");
                e.to_response(&request_id)
            }
        },
        Err(rejection) => rejection,
    };
    finish(Route::Contact, started, response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactRequest {
        ContactRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "Hello there, let's talk.".into(),
            company: None,
        }
    }

    #[test]
    fn test_valid_message_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_email_must_be_an_address() {
        let request = ContactRequest {
            email: "not-an-email".into(),
            ..valid()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_message_bounds() {
        let short = ContactRequest {
            message: "too short".into(),
            ..valid()
        };
        assert!(short.validate().is_err());

        let long = ContactRequest {
            message: "x".repeat(5001),
            ..valid()
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_company_is_optional_but_bounded() {
        let request: ContactRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","message":"Hello there, friend"}"#,
        )
        .unwrap();
        assert!(request.company.is_none());

        let long = ContactRequest {
            company: Some("c".repeat(201)),
            ..valid()
        };
        assert!(long.validate().is_err());
    }
}
