//! `POST /api/chat`

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::{Validate, ValidationError};

use crate::http::request_id::RequestId;
use crate::http::response::{json_response, with_request_id};
use crate::http::server::AppState;
use crate::routes::{admit, finish, Route};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,

    #[serde(default)]
    #[validate(length(max = 20), custom(function = "validate_history"))]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ChatTurn {
    pub role: ChatRole,

    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

fn validate_history(history: &[ChatTurn]) -> Result<(), ValidationError> {
    if history.iter().all(|turn| turn.validate().is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("history"))
    }
}

pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    request: Request,
) -> Response {
    let started = Instant::now();
    let response = match admit::<ChatRequest>(&state, Route::Chat, &request_id, request).await {
        Ok(payload) => match state.backends.chat.reply(&payload).await {
            Ok(reply) => json_response(
                &json!({ "reply": reply, "requestId": request_id.as_str() }),
                StatusCode::OK.as_u16(),
                Some(with_request_id(Default::default(), Some(&request_id))),
            ),
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Chat backend failed");
                e.to_response(&request_id)
            }
        },
        Err(rejection) => rejection,
    };
    finish(Route::Chat, started, response)
}
