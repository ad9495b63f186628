//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - streaming GET and plain POST used by the realtime client

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
