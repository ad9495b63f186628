//! Stream supervisor: keeps one event stream open while the session is active.
//!
//! Lifecycle of one iteration:
//! 1. GET the realtime endpoint with event-stream headers
//! 2. Split the body into lines, assemble events, hand them to the session
//! 3. When the body ends or breaks, open a new stream right away
//!
//! The first open is reported back to `connect()` through `ready`. Failures
//! before that point are returned to the caller; afterwards retryable
//! failures (transport, 5xx) back off and anything else stops the loop.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::session::Session;
use crate::error::{RealtimeError, RealtimeResult};
use crate::sse::{LineBuffer, SseParser};
use crate::traits::{ByteStream, HttpError};

pub(crate) async fn run(session: Arc<Session>, ready: oneshot::Sender<RealtimeResult<()>>) {
    let mut ready = Some(ready);
    let url = session.config().realtime_url();
    let headers = session.stream_headers();
    let mut failed_opens: u32 = 0;

    while session.is_active() {
        let err = match session.http().get_stream(&url, &headers).await {
            Ok(stream) => {
                failed_opens = 0;
                if let Some(ready) = ready.take() {
                    let _ = ready.send(Ok(()));
                }
                debug!(url = %url, "realtime stream opened");

                match pump(&session, stream).await {
                    Ok(()) => debug!("realtime stream closed by server, reopening"),
                    Err(err) => warn!(error = %err, "realtime stream interrupted, reopening"),
                }
                continue;
            }
            Err(err) => open_error(err),
        };

        failed_opens = failed_opens.saturating_add(1);
        let delay = session.config().backoff_for_attempt(failed_opens);

        if err.is_unknown_client_id() {
            debug!(error = %err, "server dropped the previous client id, reopening");
        } else if let Some(ready) = ready.take() {
            let _ = ready.send(Err(err));
            return;
        } else if !err.is_retryable() {
            error!(error = %err, "realtime stream rejected, stopping");
            session.supervisor_failed(err).await;
            return;
        } else {
            warn!(
                attempt = failed_opens,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "realtime stream open failed, retrying"
            );
        }

        tokio::time::sleep(delay).await;
    }

    info!("realtime supervisor stopped");
}

fn open_error(err: HttpError) -> RealtimeError {
    match err {
        HttpError::ServerError { status, message } => RealtimeError::remote(status, &message),
        other => RealtimeError::Http(other),
    }
}

/// Feed one response body through the decoder until it ends.
///
/// A malformed line or a read error ends this body with an error; either
/// way the caller opens a new stream.
pub(crate) async fn pump(session: &Session, mut stream: ByteStream) -> RealtimeResult<()> {
    let mut lines = LineBuffer::new();
    let mut parser = SseParser::new();

    while let Some(chunk) = stream.next().await {
        lines.push(&chunk?);
        while let Some(line) = lines.next_line() {
            if let Some(event) = parser.feed_line(&line)? {
                session.handle_event(event).await;
            }
        }
    }

    if lines.pending() > 0 {
        debug!(bytes = lines.pending(), "discarding unterminated line at end of stream");
    }
    Ok(())
}
