//! Error type for realtime client operations.

use thiserror::Error;

use crate::sse::SseParseError;
use crate::traits::HttpError;

/// Realtime client error variants.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Malformed SSE line; ends the current stream iteration only.
    #[error("Invalid event stream format: {0}")]
    InvalidStreamFormat(String),

    /// `connect()` called while a connection is already active.
    #[error("Realtime client is already connected")]
    AlreadyConnected,

    /// Operation requires `connect()` first.
    #[error("Realtime client is not connected")]
    NotConnected,

    /// The server answered with a non-success status.
    #[error("Remote request failed ({status}): {message}")]
    RemoteRequestFailed { status: u16, message: String },

    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RealtimeError {
    /// Build a `RemoteRequestFailed` from a raw response body.
    pub fn remote(status: u16, body: &str) -> Self {
        RealtimeError::RemoteRequestFailed {
            status,
            message: error_reason(body),
        }
    }

    /// The server did not recognise the client id it was given.
    ///
    /// The server answers this way while a fresh connection is being
    /// established, so the stream supervisor treats it as a reconnect
    /// trigger rather than a failure.
    pub fn is_unknown_client_id(&self) -> bool {
        match self {
            RealtimeError::RemoteRequestFailed { message, .. } => {
                mentions_unknown_client_id(message)
            }
            _ => false,
        }
    }

    /// Check if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RealtimeError::Http(err) => !matches!(err, HttpError::InvalidUrl(_)),
            RealtimeError::InvalidStreamFormat(_) => true,
            RealtimeError::RemoteRequestFailed { status, .. } => {
                *status >= 500 || self.is_unknown_client_id()
            }
            _ => false,
        }
    }
}

impl From<SseParseError> for RealtimeError {
    fn from(err: SseParseError) -> Self {
        RealtimeError::InvalidStreamFormat(err.to_string())
    }
}

/// Extract the human readable reason from an error body.
///
/// JSON bodies of the form `{"message": "..."}` yield the message, anything
/// else is returned trimmed as-is.
pub fn error_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn mentions_unknown_client_id(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("client id") || reason.contains("clientid")
}
