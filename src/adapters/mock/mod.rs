//! Mock implementations for testing.
//!
//! Enables unit and integration testing of the realtime client without
//! network access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and request recording

pub mod http;

pub use http::{LiveStream, MockHttpClient, MockResponse, RecordedRequest};
