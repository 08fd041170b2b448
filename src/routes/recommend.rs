//! `POST /api/recommend`

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

const MAX_INTEREST_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct RecommendRequest {
    pub persona: Persona,

    #[serde(default)]
    #[validate(length(max = 10), custom(function = "validate_interests"))]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Recruiter,
    Engineer,
    Founder,
    Other,
}

fn validate_interests(interests: &[String]) -> Result<(), ValidationError> {
    let fits = |s: &String| (1..=MAX_INTEREST_CHARS).contains(&s.chars().count());
    if interests.iter().all(fits) {
        Ok(())
    } else {
        Err(ValidationError::new("interests"))
    }
}

pub async fn handle(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    request: Request,
) -> Response {
    let started = Instant::now();
    let response =
        match admit::<RecommendRequest>(&state, Route::Recommend, &request_id, request).await {
            Ok(payload) => match state.backends.recommend.recommend(&payload).await {
                Ok(recommendations) => json_response(
                    &json!({
                        "recommendations": recommendations,
                        "requestId": request_id.as_str(),
                    }),
                    StatusCode::OK.as_u16(),
                    Some(with_request_id(Default::default(), Some(&request_id))),
                ),
                Err(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        error = %e,
                        "Recommend backend failed"
                    );
                    e.to_response(&request_id)
                }
            },
            Err(rejection) => rejection,
        };
    finish(Route::Recommend, started, response)
}
