//! Mock HTTP client for testing.
//!
//! Provides a scriptable HTTP client that returns predefined responses and
//! records every request it receives.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a complete response
    Success(Response),
    /// Return an error
    Error(HttpError),
    /// Return a stream that yields the chunks and then ends
    Stream(Vec<Bytes>),
    /// Return a stream that yields the chunks and then stays open
    OpenStream(Vec<Bytes>),
    /// Return a stream fed by a [`LiveStream`] sender
    Live(LiveStream),
}

/// Receiving half of a stream driven by the test.
///
/// Items sent through the paired sender are yielded as they arrive; dropping
/// the sender ends the stream. A live stream can be opened only once.
#[derive(Debug, Clone)]
pub struct LiveStream {
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Result<Bytes, HttpError>>>>>,
}

impl LiveStream {
    pub fn channel() -> (mpsc::UnboundedSender<Result<Bytes, HttpError>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Self {
            receiver: Arc::new(Mutex::new(Some(rx))),
        };
        (tx, stream)
    }

    fn open(&self) -> Result<ByteStream, HttpError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| HttpError::Other("Live stream already opened".to_string()))?;
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up per URL. Streaming GETs first consume the queue
/// filled by [`MockHttpClient::push_stream`], one entry per call, which makes
/// it possible to script what each reconnect sees.
///
/// # Example
///
/// ```ignore
/// use recordstream::adapters::mock::{MockHttpClient, MockResponse};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.push_stream(
///     "http://localhost/api/realtime",
///     MockResponse::OpenStream(vec![Bytes::from("id: a\ndata: {}\n\n")]),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Per-URL queue consumed by streaming requests before `responses`
    stream_queue: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            stream_queue: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response for a specific URL (exact or prefix match).
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a response for the next streaming GET to `url`.
    pub fn push_stream(&self, url: &str, response: MockResponse) {
        let mut queue = self.stream_queue.lock().unwrap();
        queue.entry(url.to_string()).or_default().push_back(response);
    }

    /// Queue a live stream for the next streaming GET to `url` and return
    /// the sender that feeds it.
    pub fn push_live_stream(
        &self,
        url: &str,
    ) -> mpsc::UnboundedSender<Result<Bytes, HttpError>> {
        let (tx, stream) = LiveStream::channel();
        self.push_stream(url, MockResponse::Live(stream));
        tx
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests with the given method.
    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.get_requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn next_stream_response(&self, url: &str) -> Option<MockResponse> {
        let mut queue = self.stream_queue.lock().unwrap();
        queue.get_mut(url).and_then(|q| q.pop_front())
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        self.record_request("GET", url, headers, None);

        let response = self
            .next_stream_response(url)
            .or_else(|| self.get_response(url));

        match response {
            Some(MockResponse::Stream(chunks)) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok));
                Ok(Box::pin(stream))
            }
            Some(MockResponse::OpenStream(chunks)) => {
                use futures::StreamExt;
                let stream = futures::stream::iter(chunks.into_iter().map(Ok))
                    .chain(futures::stream::pending());
                Ok(Box::pin(stream))
            }
            Some(MockResponse::Live(stream)) => stream.open(),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Success(response)) => Err(HttpError::ServerError {
                status: response.status,
                message: response.text_lossy(),
            }),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_))
            | Some(MockResponse::OpenStream(_))
            | Some(MockResponse::Live(_)) => Err(HttpError::Other(
                "Stream response on non-stream request".to_string(),
            )),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
