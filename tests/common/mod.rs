//! Common test utilities for integration tests.
//!
//! ```ignore
//! mod common;
//! use common::*;
//!
//! let http = accepting_http();
//! let stream = http.push_live_stream(REALTIME_URL);
//! let client = test_client(&http);
//! ```

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use recordstream::adapters::mock::{MockHttpClient, MockResponse};
use recordstream::traits::{HttpError, Response};
use recordstream::{RealtimeClient, RealtimeConfig, RealtimeMessage};
use serde_json::Value;
use tokio::sync::mpsc;

pub const BASE_URL: &str = "http://test.local";
pub const REALTIME_URL: &str = "http://test.local/api/realtime";

/// Config with short waits so tests stay fast.
pub fn test_config() -> RealtimeConfig {
    RealtimeConfig::new(BASE_URL)
        .with_identity_wait(Duration::from_millis(50))
        .with_reconnect_backoff(Duration::from_millis(5), Duration::from_millis(20))
}

/// Mock whose subscription POSTs succeed with 204.
pub fn accepting_http() -> MockHttpClient {
    let http = MockHttpClient::new();
    http.set_response(
        REALTIME_URL,
        MockResponse::Success(Response::new(204, Bytes::new())),
    );
    http
}

pub fn test_client(http: &MockHttpClient) -> RealtimeClient {
    RealtimeClient::with_http_client(test_config(), Arc::new(http.clone()))
}

/// Wire bytes for one event.
pub fn sse_event(id: Option<&str>, data: &str) -> Result<Bytes, HttpError> {
    let mut frame = String::new();
    if let Some(id) = id {
        frame.push_str(&format!("id: {}\n", id));
    }
    frame.push_str(&format!("data: {}\n\n", data));
    Ok(Bytes::from(frame))
}

/// The handshake event the server sends first on every stream.
pub fn handshake(client_id: &str) -> Result<Bytes, HttpError> {
    sse_event(
        Some(client_id),
        &format!(r#"{{"clientId":"{}"}}"#, client_id),
    )
}

/// Parsed bodies of every POST sent so far.
pub fn posted_bodies(http: &MockHttpClient) -> Vec<Value> {
    http.requests_with_method("POST")
        .into_iter()
        .filter_map(|r| r.body)
        .map(|body| serde_json::from_str(&body).expect("POST body is JSON"))
        .collect()
}

/// Poll `condition` until it holds or a second has passed.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Register a listener that forwards every message into a channel.
pub fn collect_messages(client: &RealtimeClient) -> mpsc::UnboundedReceiver<RealtimeMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    client
        .listen(move |message| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(message);
            }
        })
        .expect("client should be connected");
    rx
}

pub async fn next_message(rx: &mut mpsc::UnboundedReceiver<RealtimeMessage>) -> RealtimeMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no message within a second")
        .expect("listener stopped")
}
