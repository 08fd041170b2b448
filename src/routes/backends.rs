//! Business-logic collaborators behind the API routes.
//!
//! Inference, mail delivery and recommendation scoring live outside this
//! crate; handlers only see whether a call succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{http::StatusCode, response::Response};
use serde_json::Value;
use thiserror::Error;

use crate::http::request_id::RequestId;
use crate::http::response::error_response;
use crate::routes::chat::ChatRequest;
use crate::routes::contact::ContactRequest;
use crate::routes::recommend::RecommendRequest;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator is not configured or temporarily down.
    #[error("{0} backend unavailable")]
    Unavailable(&'static str),

    /// The collaborator was reached but failed.
    #[error("backend call failed: {0}")]
    Failed(String),
}

impl CollaboratorError {
    pub fn to_response(&self, request_id: &RequestId) -> Response {
        let (status, code, message) = match self {
            CollaboratorError::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable. Please try again later.",
            ),
            CollaboratorError::Failed(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_FAILED",
                "Upstream service failed. Please try again later.",
            ),
        };
        error_response(status, code, message, Some(request_id), None)
    }
}

/// Produces assistant replies for the chat route.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, request: &ChatRequest) -> Result<String, CollaboratorError>;
}

/// Delivers contact-form submissions.
#[async_trait]
pub trait MailBackend: Send + Sync {
    async fn deliver(&self, message: &ContactRequest) -> Result<(), CollaboratorError>;
}

/// Scores portfolio content for a visitor persona.
#[async_trait]
pub trait RecommendBackend: Send + Sync {
    async fn recommend(&self, request: &RecommendRequest) -> Result<Value, CollaboratorError>;
}

/// The set of collaborators shared by all handlers.
#[derive(Clone)]
pub struct Backends {
    pub chat: Arc<dyn ChatBackend>,
    pub mail: Arc<dyn MailBackend>,
    pub recommend: Arc<dyn RecommendBackend>,
}

impl Backends {
    /// Every collaborator reports [`CollaboratorError::Unavailable`].
    pub fn disabled() -> Self {
        let disabled = Arc::new(Disabled);
        Self {
            chat: disabled.clone(),
            mail: disabled.clone(),
            recommend: disabled,
        }
    }
}

/// Placeholder used until real collaborators are wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl ChatBackend for Disabled {
    async fn reply(&self, _request: &ChatRequest) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("chat"))
    }
}

#[async_trait]
impl MailBackend for Disabled {
    async fn deliver(&self, _message: &ContactRequest) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unavailable("mail"))
    }
}

#[async_trait]
impl RecommendBackend for Disabled {
    async fn recommend(&self, _request: &RecommendRequest) -> Result<Value, CollaboratorError> {
        Err(CollaboratorError::Unavailable("recommend"))
    }
}
