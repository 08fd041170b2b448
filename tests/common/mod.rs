//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
};
use serde_json::{json, Value};

use portfolio_gateway::routes::chat::ChatRequest;
use portfolio_gateway::routes::contact::ContactRequest;
use portfolio_gateway::routes::recommend::RecommendRequest;
use portfolio_gateway::routes::{
    Backends, ChatBackend, CollaboratorError, MailBackend, RecommendBackend,
};
use portfolio_gateway::{GatewayConfig, HttpServer};

/// Replies with the message it was given.
pub struct EchoChat;

#[async_trait]
impl ChatBackend for EchoChat {
    async fn reply(&self, request: &ChatRequest) -> Result<String, CollaboratorError> {
        Ok(format!("echo: {}", request.message))
    }
}

/// Keeps every delivered message.
#[derive(Default)]
pub struct RecordingMail {
    pub delivered: Mutex<Vec<ContactRequest>>,
}

#[async_trait]
impl MailBackend for RecordingMail {
    async fn deliver(&self, message: &ContactRequest) -> Result<(), CollaboratorError> {
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Returns one recommendation per interest.
pub struct StaticRecommend;

#[async_trait]
impl RecommendBackend for StaticRecommend {
    async fn recommend(&self, request: &RecommendRequest) -> Result<Value, CollaboratorError> {
        Ok(json!(request
            .interests
            .iter()
            .map(|i| json!({ "project": format!("{i}-project") }))
            .collect::<Vec<_>>()))
    }
}

/// Fails every chat call.
pub struct BrokenChat;

#[async_trait]
impl ChatBackend for BrokenChat {
    async fn reply(&self, _request: &ChatRequest) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Failed("connection reset by inference host".into()))
    }
}

/// Never answers within a test's request timeout.
pub struct StalledChat;

#[async_trait]
impl ChatBackend for StalledChat {
    async fn reply(&self, _request: &ChatRequest) -> Result<String, CollaboratorError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".into())
    }
}

pub fn working_backends() -> (Backends, Arc<RecordingMail>) {
    let mail = Arc::new(RecordingMail::default());
    let backends = Backends {
        chat: Arc::new(EchoChat),
        mail: mail.clone(),
        recommend: Arc::new(StaticRecommend),
    };
    (backends, mail)
}

pub fn test_server() -> HttpServer {
    HttpServer::new(GatewayConfig::default(), working_backends().0)
}

/// A JSON POST from a client identified by `x-forwarded-for`.
pub fn post_json(path: &str, client: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(body.into())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn chat_body(message: &str) -> String {
    json!({ "message": message }).to_string()
}

pub fn contact_body() -> String {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "message": "I'd like to talk about an engine.",
    })
    .to_string()
}
