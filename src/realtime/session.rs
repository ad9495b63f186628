//! Realtime session state and subscription reconciliation.
//!
//! The session owns the connection state, the server-assigned client id and
//! the subscription set. Every change to them happens under one async mutex,
//! and the reconciliation request that follows a change is sent before the
//! lock is released, so the server always receives the set as it was right
//! after that change.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::hub::{FanoutHub, ListenerHandle};
use super::messages::RealtimeMessage;
use super::supervisor;
use crate::config::RealtimeConfig;
use crate::error::{RealtimeError, RealtimeResult};
use crate::sse::SseEvent;
use crate::traits::{Headers, HttpClient};

/// Connection lifecycle of a realtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// `connect()` is waiting for the first stream to open
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    connection: ConnectionState,
    client_id: Option<String>,
    /// Insertion ordered, no duplicates
    subscriptions: Vec<String>,
    last_error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRequest<'a> {
    client_id: &'a str,
    subscriptions: &'a [String],
}

pub(crate) struct Session {
    config: RealtimeConfig,
    http: Arc<dyn HttpClient>,
    state: tokio::sync::Mutex<SessionState>,
    connection_tx: watch::Sender<ConnectionState>,
    hub: FanoutHub,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub(crate) fn new(config: RealtimeConfig, http: Arc<dyn HttpClient>) -> Self {
        let (connection_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            http,
            state: tokio::sync::Mutex::new(SessionState::default()),
            connection_tx,
            hub: FanoutHub::new(),
            supervisor: Mutex::new(None),
        }
    }

    pub(crate) fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &dyn HttpClient {
        self.http.as_ref()
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        *self.connection_tx.borrow()
    }

    pub(crate) fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.connection_tx.subscribe()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.connection_state().is_active()
    }

    pub(crate) async fn client_id(&self) -> Option<String> {
        self.state.lock().await.client_id.clone()
    }

    pub(crate) async fn subscriptions(&self) -> Vec<String> {
        self.state.lock().await.subscriptions.clone()
    }

    pub(crate) async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    fn set_connection(&self, state: &mut SessionState, connection: ConnectionState) {
        state.connection = connection;
        self.connection_tx.send_replace(connection);
    }

    fn lock_supervisor(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.supervisor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Headers for the event stream request.
    pub(crate) fn stream_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers.insert("Connection".to_string(), "keep-alive".to_string());
        self.apply_auth(&mut headers);
        headers
    }

    fn json_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        self.apply_auth(&mut headers);
        headers
    }

    fn apply_auth(&self, headers: &mut Headers) {
        if let Some(token) = &self.config.auth_token {
            headers.insert("Authorization".to_string(), token.clone());
        }
    }

    /// Start the stream supervisor and wait for the first open to resolve.
    pub(crate) async fn connect(self: &Arc<Self>) -> RealtimeResult<()> {
        let ready_rx = {
            let mut state = self.state.lock().await;
            if state.connection.is_active() {
                return Err(RealtimeError::AlreadyConnected);
            }
            self.set_connection(&mut state, ConnectionState::Connecting);
            state.client_id = None;
            state.last_error = None;

            // Must be stored before the state lock is released
            let (ready_tx, ready_rx) = oneshot::channel();
            let task = tokio::spawn(supervisor::run(Arc::clone(self), ready_tx));
            *self.lock_supervisor() = Some(task);
            ready_rx
        };

        match ready_rx.await {
            Ok(Ok(())) => {
                let mut state = self.state.lock().await;
                if state.connection == ConnectionState::Connecting {
                    self.set_connection(&mut state, ConnectionState::Connected);
                }
                info!(url = %self.config.realtime_url(), "realtime connected");
                Ok(())
            }
            Ok(Err(err)) => {
                let mut state = self.state.lock().await;
                self.lock_supervisor().take();
                self.set_connection(&mut state, ConnectionState::Disconnected);
                state.last_error = Some(err.to_string());
                Err(err)
            }
            // Supervisor was cancelled by a concurrent disconnect()
            Err(_) => Err(RealtimeError::NotConnected),
        }
    }

    /// Called by the supervisor when it stops on a fatal status after the
    /// initial handshake.
    pub(crate) async fn supervisor_failed(&self, err: RealtimeError) {
        {
            let mut state = self.state.lock().await;
            self.lock_supervisor().take();
            self.set_connection(&mut state, ConnectionState::Disconnected);
            state.client_id = None;
            state.last_error = Some(err.to_string());
        }
        self.hub.cancel_all();
    }

    /// Tear down the session. Safe to call at any time, any number of times,
    /// including from inside a listener callback.
    ///
    /// Listeners are cancelled only after the final request has completed;
    /// the caller may itself be running on a listener task.
    pub(crate) async fn disconnect(&self) {
        let (was_active, final_client_id, listeners) = {
            let mut state = self.state.lock().await;
            if let Some(task) = self.lock_supervisor().take() {
                task.abort();
            }
            let was_active = state.connection.is_active();
            self.set_connection(&mut state, ConnectionState::Disconnected);
            state.subscriptions.clear();
            (was_active, state.client_id.take(), self.hub.detach_all())
        };

        if let Some(client_id) = final_client_id {
            if let Err(err) = self.send_subscriptions(&client_id, &[]).await {
                warn!(client_id = %client_id, error = %err, "final unsubscribe failed");
            }
        }

        if was_active {
            info!("realtime disconnected");
        } else {
            debug!("disconnect called while already disconnected");
        }

        for listener in listeners {
            listener.cancel();
        }
    }

    /// React to one assembled stream event.
    ///
    /// A new `id` means the server assigned a new identity (first event or
    /// a reconnect); the full subscription set is re-registered under it.
    /// The payload is then decoded and published.
    pub(crate) async fn handle_event(&self, event: SseEvent) {
        if let Some(id) = event.id.as_deref().filter(|id| !id.is_empty()) {
            let mut state = self.state.lock().await;
            if !state.connection.is_active() {
                debug!(client_id = id, "ignoring event for a disconnected session");
                return;
            }
            if state.client_id.as_deref() != Some(id) {
                info!(client_id = id, "realtime client id assigned");
                state.client_id = Some(id.to_string());
                if let Err(err) = self.send_subscriptions(id, &state.subscriptions).await {
                    warn!(
                        client_id = id,
                        error = %err,
                        "failed to register subscriptions for new client id"
                    );
                }
            }
        }

        let message = RealtimeMessage::from_event_data(&event.data);
        trace!(
            action = %message.action(),
            event = event.event.as_deref().unwrap_or(""),
            "publishing realtime message"
        );
        self.hub.publish(message);
    }

    pub(crate) async fn subscribe(&self, topic: String) -> RealtimeResult<()> {
        self.update_subscriptions(move |subscriptions| {
            if !subscriptions.contains(&topic) {
                subscriptions.push(topic);
            }
        })
        .await
    }

    pub(crate) async fn unsubscribe(&self, topic: &str) -> RealtimeResult<()> {
        self.update_subscriptions(|subscriptions| subscriptions.retain(|t| t != topic))
            .await
    }

    pub(crate) async fn unsubscribe_by_prefix(&self, prefix: &str) -> RealtimeResult<()> {
        self.update_subscriptions(|subscriptions| {
            subscriptions.retain(|t| !t.starts_with(prefix))
        })
        .await
    }

    pub(crate) async fn unsubscribe_all(&self) -> RealtimeResult<()> {
        self.update_subscriptions(|subscriptions| subscriptions.clear())
            .await
    }

    pub(crate) fn listen<F, Fut>(&self, callback: F) -> RealtimeResult<ListenerHandle>
    where
        F: FnMut(RealtimeMessage) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if !self.is_active() {
            return Err(RealtimeError::NotConnected);
        }
        Ok(self.hub.listen(callback))
    }

    /// Mutate the subscription set and send the whole set to the server.
    ///
    /// Without a client id yet, the call first gives the handshake
    /// `identity_wait` to complete. If there is still no id afterwards the
    /// change is only recorded locally; the identity handler sends the set
    /// once the id arrives.
    async fn update_subscriptions<F>(&self, mutate: F) -> RealtimeResult<()>
    where
        F: FnOnce(&mut Vec<String>),
    {
        let identified = {
            let state = self.state.lock().await;
            if !state.connection.is_active() {
                return Err(RealtimeError::NotConnected);
            }
            state.client_id.is_some()
        };
        if !identified {
            debug!(
                wait_ms = self.config.identity_wait.as_millis() as u64,
                "waiting for realtime client id"
            );
            tokio::time::sleep(self.config.identity_wait).await;
        }

        let mut state = self.state.lock().await;
        if !state.connection.is_active() {
            return Err(RealtimeError::NotConnected);
        }
        mutate(&mut state.subscriptions);

        match state.client_id.clone() {
            Some(client_id) => self.send_subscriptions(&client_id, &state.subscriptions).await,
            None => {
                debug!(
                    topics = state.subscriptions.len(),
                    "no client id yet, subscriptions recorded locally"
                );
                Ok(())
            }
        }
    }

    /// POST the complete subscription set for `client_id`.
    async fn send_subscriptions(
        &self,
        client_id: &str,
        subscriptions: &[String],
    ) -> RealtimeResult<()> {
        let body = serde_json::to_string(&SubscriptionRequest {
            client_id,
            subscriptions,
        })?;
        let response = self
            .http
            .post(&self.config.realtime_url(), &body, &self.json_headers())
            .await?;

        if !response.is_success() {
            return Err(RealtimeError::remote(response.status, &response.text_lossy()));
        }
        debug!(
            client_id,
            topics = subscriptions.len(),
            "subscriptions reconciled"
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn force_state(&self, connection: ConnectionState, client_id: Option<&str>) {
        let mut state = self.state.lock().await;
        self.set_connection(&mut state, connection);
        state.client_id = client_id.map(str::to_string);
    }
}
