//! Error handling for the realtime client.
//!
//! | Variant | Raised by | Surfaced |
//! |---------|-----------|----------|
//! | `InvalidStreamFormat` | SSE decoder | No, the supervisor reconnects |
//! | `AlreadyConnected` | `connect()` | Yes |
//! | `NotConnected` | subscribe / unsubscribe / listen | Yes |
//! | `RemoteRequestFailed` | stream open, subscription POST | Yes, except unknown client id on stream open |
//! | `Http` | transport | On the first stream open and on POSTs |

mod realtime_error;
mod result;

pub use realtime_error::{error_reason, RealtimeError};
pub use result::RealtimeResult;
