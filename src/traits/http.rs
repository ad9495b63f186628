//! HTTP client trait abstraction.
//!
//! The realtime client only needs two primitives from its transport: a
//! streaming GET for the event stream and a plain POST for subscription
//! updates. Keeping them behind a trait lets the session run against the
//! reqwest adapter in production and a scripted mock in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use thiserror::Error;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Incrementally received response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level HTTP errors.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
    /// Server answered a streaming request with a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
    /// IO error while reading a body
    #[error("IO error: {0}")]
    Io(String),
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Other error
    #[error("HTTP error: {0}")]
    Other(String),
}

/// Trait for the HTTP operations the realtime client depends on.
///
/// # Example
///
/// ```ignore
/// use recordstream::traits::{Headers, HttpClient};
///
/// async fn open<C: HttpClient>(client: &C) {
///     let mut headers = Headers::new();
///     headers.insert("Accept".to_string(), "text/event-stream".to_string());
///     let body = client.get_stream("http://127.0.0.1:8090/api/realtime", &headers).await;
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and return the body as a stream of chunks.
    ///
    /// Implementations must not apply a read timeout: the stream stays open
    /// for as long as the server keeps it open. A non-2xx status is reported
    /// as [`HttpError::ServerError`] carrying the body text.
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError>;

    /// Perform a POST request with a textual body.
    ///
    /// Non-2xx statuses are returned as a normal [`Response`]; only
    /// transport failures produce an error.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;
}
