//! SSE (Server-Sent Events) stream decoding
//!
//! Decodes the text event stream served by the realtime endpoint:
//! - `id: <value>` - client identity / event id
//! - `event: <name>` - event name
//! - `data: <payload>` - payload line
//! - Empty line - signals end of event
//!
//! # Module structure
//! - `events` - Fragment and event types (SseLine, SseEvent, SseParseError)
//! - `parser` - Line decoder and event assembler (parse_sse_line, SseParser)
//! - `line_buffer` - Byte chunk to line splitting

mod events;
mod line_buffer;
mod parser;

pub use events::{SseEvent, SseLine, SseParseError};
pub use line_buffer::LineBuffer;
pub use parser::{parse_sse_line, SseParser};
