//! Realtime subscription client.
//!
//! Data flow: response bytes → SSE decoder → session → fan-out hub → listeners.
//!
//! - `client` - public [`RealtimeClient`] façade
//! - `session` - connection state, client id and subscription reconciliation
//! - `supervisor` - keeps the event stream open, reopening it when it ends
//! - `hub` - latest-wins delivery to listener tasks
//! - `messages` - typed messages decoded from event payloads

mod client;
mod hub;
mod messages;
mod session;
mod supervisor;

pub use client::RealtimeClient;
pub use hub::{FanoutHub, ListenerHandle};
pub use messages::{RealtimeAction, RealtimeMessage};
pub use session::ConnectionState;
