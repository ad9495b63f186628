//! recordstream - realtime subscription client for record-oriented backends
//!
//! Keeps a Server-Sent Events stream open against `/api/realtime`, keeps the
//! server's view of the client's topic subscriptions in sync across
//! reconnects, and fans decoded record events out to listeners.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod realtime;
pub mod sse;
pub mod traits;

pub use config::RealtimeConfig;
pub use error::{RealtimeError, RealtimeResult};
pub use realtime::{ConnectionState, RealtimeAction, RealtimeClient, RealtimeMessage};
