//! Fan-out of realtime messages to listener tasks.
//!
//! Every listener owns a `watch` receiver over a single shared slot, which
//! gives each of them a size-1 mailbox: publishing overwrites the slot
//! without waiting, and a listener that is still busy with an older message
//! only sees the most recent one when it comes back.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use super::messages::RealtimeMessage;

/// Handle to a single registered listener.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    abort: AbortHandle,
}

impl ListenerHandle {
    /// Stop this listener. Other listeners are unaffected.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Multicast hub with latest-wins delivery per listener.
#[derive(Debug)]
pub struct FanoutHub {
    slot: watch::Sender<Option<RealtimeMessage>>,
    listeners: Mutex<Vec<AbortHandle>>,
}

impl FanoutHub {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Publish a message to every listener. Never waits.
    pub fn publish(&self, message: RealtimeMessage) {
        self.slot.send_replace(Some(message));
    }

    /// Spawn a listener task that runs `callback` for each message it
    /// observes. Only messages published after registration are delivered.
    pub fn listen<F, Fut>(&self, mut callback: F) -> ListenerHandle
    where
        F: FnMut(RealtimeMessage) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut mailbox = self.slot.subscribe();
        let task = tokio::spawn(async move {
            while mailbox.changed().await.is_ok() {
                let latest = mailbox.borrow_and_update().clone();
                if let Some(message) = latest {
                    callback(message).await;
                }
            }
        });

        let abort = task.abort_handle();
        let mut listeners = self.lock_listeners();
        listeners.retain(|handle| !handle.is_finished());
        listeners.push(abort.clone());
        debug!(listeners = listeners.len(), "realtime listener registered");

        ListenerHandle { abort }
    }

    /// Number of listener tasks still running.
    pub fn listener_count(&self) -> usize {
        self.lock_listeners()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Abort every listener task.
    pub fn cancel_all(&self) {
        for listener in self.detach_all() {
            listener.cancel();
        }
    }

    /// Unregister every listener without stopping it yet.
    ///
    /// Listeners registered afterwards are not part of the returned set.
    pub fn detach_all(&self) -> Vec<ListenerHandle> {
        let listeners: Vec<ListenerHandle> = self
            .lock_listeners()
            .drain(..)
            .map(|abort| ListenerHandle { abort })
            .collect();
        if !listeners.is_empty() {
            debug!(listeners = listeners.len(), "detaching realtime listeners");
        }
        listeners
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<AbortHandle>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::messages::RealtimeAction;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    fn created(id: &str) -> RealtimeMessage {
        RealtimeMessage::record_change(RealtimeAction::Create, json!({ "id": id }))
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<RealtimeMessage>) -> RealtimeMessage {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("listener did not receive a message")
            .expect("listener channel closed")
    }

    #[tokio::test]
    async fn test_every_listener_receives_message() {
        let hub = FanoutHub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        hub.listen(move |m| {
            let tx = tx_a.clone();
            async move {
                let _ = tx.send(m);
            }
        });
        hub.listen(move |m| {
            let tx = tx_b.clone();
            async move {
                let _ = tx.send(m);
            }
        });
        assert_eq!(hub.listener_count(), 2);

        hub.publish(created("1"));

        assert_eq!(recv(&mut rx_a).await, created("1"));
        assert_eq!(recv(&mut rx_b).await, created("1"));
    }

    #[tokio::test]
    async fn test_busy_listener_sees_only_latest() {
        let hub = FanoutHub::new();
        let gate = Arc::new(Notify::new());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        let listener_gate = gate.clone();
        hub.listen(move |m| {
            let gate = listener_gate.clone();
            let seen = seen_tx.clone();
            async move {
                let first = seen.send(m.clone()).is_ok() && m == created("1");
                if first {
                    gate.notified().await;
                }
            }
        });

        hub.publish(created("1"));
        assert_eq!(recv(&mut seen_rx).await, created("1"));

        // Listener is parked inside its callback for message 1
        hub.publish(created("2"));
        hub.publish(created("3"));
        gate.notify_one();

        assert_eq!(recv(&mut seen_rx).await, created("3"));
        let nothing = tokio::time::timeout(Duration::from_millis(50), seen_rx.recv()).await;
        assert!(nothing.is_err(), "no queued messages should be replayed");
    }

    #[tokio::test]
    async fn test_slow_listener_does_not_block_fast_one() {
        let hub = FanoutHub::new();
        let gate = Arc::new(Notify::new());
        let (fast_tx, mut fast_rx) = mpsc::unbounded_channel();

        let slow_gate = gate.clone();
        hub.listen(move |_| {
            let gate = slow_gate.clone();
            async move { gate.notified().await }
        });
        hub.listen(move |m| {
            let tx = fast_tx.clone();
            async move {
                let _ = tx.send(m);
            }
        });

        hub.publish(created("1"));
        assert_eq!(recv(&mut fast_rx).await, created("1"));
        hub.publish(created("2"));
        assert_eq!(recv(&mut fast_rx).await, created("2"));
        gate.notify_waiters();
    }

    #[tokio::test]
    async fn test_messages_before_listen_are_not_replayed() {
        let hub = FanoutHub::new();
        hub.publish(created("old"));

        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.listen(move |m| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(m);
            }
        });

        hub.publish(created("new"));
        assert_eq!(recv(&mut rx).await, created("new"));
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let hub = FanoutHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<RealtimeMessage>();
        let handle = hub.listen(move |m| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(m);
            }
        });

        hub.cancel_all();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
        assert_eq!(hub.listener_count(), 0);

        hub.publish(created("1"));
        // The callback (and its sender) were dropped with the task
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_detached_listeners_run_until_cancelled() {
        let hub = FanoutHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.listen(move |m| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(m);
            }
        });

        let detached = hub.detach_all();
        assert_eq!(detached.len(), 1);
        assert_eq!(hub.listener_count(), 0);

        let later = hub.listen(|_| async {});
        hub.publish(created("1"));
        assert_eq!(recv(&mut rx).await, created("1"));

        for listener in &detached {
            listener.cancel();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(detached[0].is_finished());
        assert!(!later.is_finished());
    }

    #[tokio::test]
    async fn test_cancel_single_listener() {
        let hub = FanoutHub::new();
        let first = hub.listen(|_| async {});
        let _second = hub.listen(|_| async {});

        first.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(hub.listener_count(), 1);
    }
}
