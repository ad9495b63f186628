//! Public realtime client.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::hub::ListenerHandle;
use super::messages::RealtimeMessage;
use super::session::{ConnectionState, Session};
use crate::adapters::ReqwestHttpClient;
use crate::config::RealtimeConfig;
use crate::error::RealtimeResult;
use crate::traits::HttpClient;

/// Self-reconnecting realtime subscription client.
///
/// Cloning is cheap; every clone drives the same session. Background tasks
/// keep running until [`disconnect`](Self::disconnect) is called.
///
/// # Example
///
/// ```ignore
/// use recordstream::{RealtimeClient, RealtimeConfig};
///
/// let client = RealtimeClient::new(RealtimeConfig::new("http://127.0.0.1:8090"));
/// client.connect().await?;
/// client.listen(|message| async move {
///     println!("{} {:?}", message.action(), message.payload());
/// })?;
/// client.subscribe("posts").await?;
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    session: Arc<Session>,
}

impl RealtimeClient {
    /// Create a client backed by reqwest.
    pub fn new(config: RealtimeConfig) -> Self {
        let http = ReqwestHttpClient::new().with_request_timeout(config.request_timeout);
        Self::with_http_client(config, Arc::new(http))
    }

    /// Create a client over any [`HttpClient`] implementation.
    pub fn with_http_client(config: RealtimeConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            session: Arc::new(Session::new(config, http)),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        self.session.config()
    }

    /// Open the event stream.
    ///
    /// Resolves once the first stream request has been answered. Fails with
    /// `AlreadyConnected` if a connection is active or being established.
    pub async fn connect(&self) -> RealtimeResult<()> {
        self.session.connect().await
    }

    /// Close the stream, clear all subscriptions and stop every listener.
    ///
    /// Never fails and may be called repeatedly.
    pub async fn disconnect(&self) {
        self.session.disconnect().await
    }

    /// Add a topic (`collection`, `collection/record_id` or `*`).
    pub async fn subscribe(&self, topic: impl Into<String>) -> RealtimeResult<()> {
        self.session.subscribe(topic.into()).await
    }

    pub async fn unsubscribe(&self, topic: &str) -> RealtimeResult<()> {
        self.session.unsubscribe(topic).await
    }

    /// Remove every topic starting with `prefix`.
    pub async fn unsubscribe_by_prefix(&self, prefix: &str) -> RealtimeResult<()> {
        self.session.unsubscribe_by_prefix(prefix).await
    }

    pub async fn unsubscribe_all(&self) -> RealtimeResult<()> {
        self.session.unsubscribe_all().await
    }

    /// Run `callback` for messages published from now on.
    ///
    /// While a callback is still running, newer messages replace each other
    /// and only the latest one is delivered next.
    pub fn listen<F, Fut>(&self, callback: F) -> RealtimeResult<ListenerHandle>
    where
        F: FnMut(RealtimeMessage) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.session.listen(callback)
    }

    pub fn state(&self) -> ConnectionState {
        self.session.connection_state()
    }

    /// Subscribe to connection state changes
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.session.state_receiver()
    }

    /// Identity assigned by the server for the current stream.
    pub async fn client_id(&self) -> Option<String> {
        self.session.client_id().await
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.session.subscriptions().await
    }

    /// Why the last connection attempt or supervisor run ended, if it failed.
    pub async fn last_error(&self) -> Option<String> {
        self.session.last_error().await
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("url", &self.config().realtime_url())
            .field("state", &self.state())
            .finish()
    }
}
