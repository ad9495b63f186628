//! Realtime client over reqwest against a local HTTP server.

use std::time::Duration;

use recordstream::traits::HttpClient;
use recordstream::adapters::ReqwestHttpClient;
use recordstream::{RealtimeClient, RealtimeConfig, RealtimeError};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HANDSHAKE_BODY: &str = "id: w1\ndata: {\"clientId\":\"w1\"}\n\n";

fn config_for(server: &MockServer) -> RealtimeConfig {
    RealtimeConfig::new(server.uri())
        .with_auth_token("secret")
        .with_identity_wait(Duration::from_millis(200))
        .with_request_timeout(Duration::from_secs(5))
}

/// First GET answers with `body` and closes; later GETs hang.
async fn mount_stream(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .and(header("Accept", "text/event-stream"))
        .and(header("Authorization", "secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(60)))
        .mount(server)
        .await;
}

async fn posted_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice(&r.body).expect("POST body is JSON"))
        .collect()
}

async fn wait_for_client_id(client: &RealtimeClient, id: &str) {
    for _ in 0..100 {
        if client.client_id().await.as_deref() == Some(id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("client id never became {}", id);
}

#[tokio::test]
async fn test_subscriptions_are_posted_under_stream_identity() {
    let server = MockServer::start().await;
    mount_stream(&server, HANDSHAKE_BODY).await;
    Mock::given(method("POST"))
        .and(path("/api/realtime"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();
    wait_for_client_id(&client, "w1").await;

    client.subscribe("posts").await.unwrap();
    client.subscribe("users/u1").await.unwrap();

    let bodies = posted_bodies(&server).await;
    assert_eq!(
        bodies,
        vec![
            json!({"clientId": "w1", "subscriptions": []}),
            json!({"clientId": "w1", "subscriptions": ["posts"]}),
            json!({"clientId": "w1", "subscriptions": ["posts", "users/u1"]}),
        ]
    );

    client.disconnect().await;
    assert_eq!(
        posted_bodies(&server).await.last(),
        Some(&json!({"clientId": "w1", "subscriptions": []}))
    );
}

#[tokio::test]
async fn test_forbidden_stream_fails_connect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"code": 403, "message": "forbidden"})),
        )
        .mount(&server)
        .await;

    let client = RealtimeClient::new(config_for(&server));
    match client.connect().await {
        Err(RealtimeError::RemoteRequestFailed { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("Expected RemoteRequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_subscription_is_returned() {
    let server = MockServer::start().await;
    mount_stream(&server, HANDSHAKE_BODY).await;
    Mock::given(method("POST"))
        .and(path("/api/realtime"))
        .and(body_json(json!({"clientId": "w1", "subscriptions": []})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/realtime"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid topic."})),
        )
        .mount(&server)
        .await;

    let client = RealtimeClient::new(config_for(&server));
    client.connect().await.unwrap();
    wait_for_client_id(&client, "w1").await;

    match client.subscribe("??").await {
        Err(RealtimeError::RemoteRequestFailed { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid topic.");
        }
        other => panic!("Expected RemoteRequestFailed, got {:?}", other),
    }
    // The change stays recorded locally
    assert_eq!(client.subscriptions().await, vec!["??"]);

    client.disconnect().await;
}

#[tokio::test]
async fn test_adapter_streams_body_chunks() {
    use futures_util::StreamExt;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: one\n\ndata: two\n\n"))
        .mount(&server)
        .await;

    let http = ReqwestHttpClient::new();
    let mut stream = http
        .get_stream(&format!("{}/events", server.uri()), &Default::default())
        .await
        .unwrap();

    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, b"data: one\n\ndata: two\n\n");
}

#[tokio::test]
async fn test_adapter_post_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/realtime"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Missing or invalid client id."))
        .mount(&server)
        .await;

    let http = ReqwestHttpClient::new().with_request_timeout(Duration::from_secs(5));
    let response = http
        .post(
            &format!("{}/api/realtime", server.uri()),
            "{}",
            &Default::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.text_lossy(), "Missing or invalid client id.");
}
