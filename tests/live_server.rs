//! Tests against a server bound to a real socket.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use portfolio_gateway::lifecycle::Shutdown;
use portfolio_gateway::GatewayConfig;

mod common;

#[tokio::test]
async fn test_serves_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = common::test_server();
    let shutdown = Shutdown::new();
    let (_updates_tx, updates_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(server.run(listener, updates_rx, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let res = client
        .post(format!("http://{addr}/api/chat"))
        .header("x-forwarded-for", "198.51.100.20")
        .header("x-request-id", "live-1")
        .json(&json!({ "message": "over the wire" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-request-id"], "live-1");
    assert_eq!(res.headers()["cache-control"], "no-store");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reply"], "echo: over the wire");
    assert_eq!(body["requestId"], "live-1");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_config_update_reaches_running_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = common::test_server();
    let shutdown = Shutdown::new();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(server.run(listener, updates_rx, shutdown.subscribe()));

    let mut config = GatewayConfig::default();
    config.routes.contact.max_requests = 1;
    updates_tx.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::new();
    let send = || {
        client
            .post(format!("http://{addr}/api/contact"))
            .header("x-forwarded-for", "198.51.100.21")
            .header("content-type", "application/json")
            .body(common::contact_body())
            .send()
    };

    assert_eq!(send().await.unwrap().status(), 200);
    let limited = send().await.unwrap();
    assert_eq!(limited.status(), 429);
    assert!(limited.headers().contains_key("retry-after"));

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
