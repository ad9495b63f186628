//! SSE line fragments, assembled events and decoder errors.

use thiserror::Error;

/// Represents a decoded SSE line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `id: <value>`
    Id(String),
    /// `event: <value>`
    Event(String),
    /// `data: <value>`
    Data(String),
    /// Empty line - signals end of event
    Empty,
}

/// One blank-line terminated block of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Create an event carrying only a data payload.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            id: None,
            event: None,
            data: data.into(),
        }
    }

    /// Set the `id` field.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `event` field.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Malformed stream line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SseParseError {
    /// Non-empty line without a `field:value` separator
    #[error("line has no field separator: {line:?}")]
    MissingColon { line: String },
    /// Field name other than `id`, `event` or `data`
    #[error("unsupported field {field:?}")]
    UnknownField { field: String },
}
