//! Shared helpers for the gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};

use watchtower_gateway::app_state::AppState;
use watchtower_gateway::config::{self, WatchtowerConfig};

/// Fast heartbeats and a short send timeout so stream tests stay quick.
pub fn test_config() -> WatchtowerConfig {
    config::load_from_str(
        r#"
version: 1
server:
  listen: "127.0.0.1:0"
realtime:
  heartbeat_interval_ms: 150
  send_timeout_ms: 200
  outbound_queue: 16
  max_connections: 4
"#,
    )
    .unwrap()
}

pub fn test_state() -> AppState {
    AppState::new(test_config()).unwrap()
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await).unwrap()
}

/// Lines of a `/metrics` snapshot that belong to `family`.
pub fn family_lines(rendered: &str, family: &str) -> Vec<String> {
    rendered
        .lines()
        .filter(|l| l.starts_with(family) && !l.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Poll `cond` every 10ms until it holds or `limit` elapses.
pub async fn wait_until<F, Fut>(limit: Duration, mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if cond().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
