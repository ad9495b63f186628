//! Result type alias for realtime operations.

use super::realtime_error::RealtimeError;

/// Type alias for Results using RealtimeError.
///
/// # Example
///
/// ```ignore
/// use recordstream::error::RealtimeResult;
///
/// async fn watch_posts(client: &RealtimeClient) -> RealtimeResult<()> {
///     client.subscribe("posts").await
/// }
/// ```
pub type RealtimeResult<T> = Result<T, RealtimeError>;
