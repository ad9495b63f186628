//! SSE stream parsing logic
//!
//! `parse_sse_line` decodes a single line into an [`SseLine`] fragment and
//! [`SseParser`] accumulates fragments until a blank line completes an event.

use crate::sse::events::{SseEvent, SseLine, SseParseError};

/// Parse a single SSE line into its component type.
///
/// The value is everything after the first colon, with at most one leading
/// space removed.
pub fn parse_sse_line(line: &str) -> Result<SseLine, SseParseError> {
    if line.trim().is_empty() {
        return Ok(SseLine::Empty);
    }

    let Some((field, value)) = line.split_once(':') else {
        return Err(SseParseError::MissingColon {
            line: line.to_string(),
        });
    };
    let value = value.strip_prefix(' ').unwrap_or(value).to_string();

    match field {
        "id" => Ok(SseLine::Id(value)),
        "event" => Ok(SseLine::Event(value)),
        "data" => Ok(SseLine::Data(value)),
        other => Err(SseParseError::UnknownField {
            field: other.to_string(),
        }),
    }
}

/// Stateful assembler that accumulates fragments and emits complete events
#[derive(Debug, Default)]
pub struct SseParser {
    id: Option<String>,
    event: Option<String>,
    data: Option<String>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw line to the parser, potentially returning a complete event
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A blank line completed an event
    /// - `Ok(None)` - Line was consumed, no event yet
    /// - `Err(error)` - The line is not valid SSE
    pub fn feed_line(&mut self, line: &str) -> Result<Option<SseEvent>, SseParseError> {
        parse_sse_line(line).map(|fragment| self.feed(fragment))
    }

    /// Feed an already decoded fragment.
    ///
    /// Repeated fields before a terminator overwrite each other. A terminator
    /// without any `data` discards whatever was accumulated.
    pub fn feed(&mut self, fragment: SseLine) -> Option<SseEvent> {
        match fragment {
            SseLine::Id(value) => {
                self.id = Some(value);
                None
            }
            SseLine::Event(value) => {
                self.event = Some(value);
                None
            }
            SseLine::Data(value) => {
                self.data = Some(value);
                None
            }
            SseLine::Empty => self.try_emit_event(),
        }
    }

    fn try_emit_event(&mut self) -> Option<SseEvent> {
        let id = self.id.take();
        let event = self.event.take();
        let data = self.data.take()?;
        Some(SseEvent { id, event, data })
    }
}
