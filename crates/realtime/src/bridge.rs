//! Scoped realtime subscriptions.
//!
//! [`RealtimeBridge::subscribe`] returns a [`Subscription`] guard at once and
//! registers with the transport in the background. Dropping the guard (or
//! calling [`Subscription::unsubscribe`]) releases the registration. A
//! registration that completes after the guard is gone is released
//! immediately. Delivery stops the moment the guard is released, even while
//! the transport is still tearing the registration down.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::event::{topic, RecordEvent};
use crate::transport::{EventHandler, RealtimeTransport};

/// Lifecycle of one subscription guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Registration in flight.
    Pending,
    /// The server accepted the registration.
    Active,
    /// Registration failed; the guard is inert.
    Failed(String),
    /// Released.
    Closed,
}

/// Entry point for creating subscriptions over a shared transport.
#[derive(Clone)]
pub struct RealtimeBridge {
    transport: Arc<dyn RealtimeTransport>,
}

impl RealtimeBridge {
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self { transport }
    }

    /// Subscribe to changes in `collection`, optionally narrowed by a
    /// server-side `filter`. Must be called inside a Tokio runtime.
    pub fn subscribe<F>(&self, collection: &str, filter: Option<&str>, callback: F) -> Subscription
    where
        F: Fn(RecordEvent) + Send + Sync + 'static,
    {
        let topic = topic(collection, filter);
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Pending);
        let gate = cancel.clone();
        let handler: EventHandler = Arc::new(move |event| {
            if !gate.is_cancelled() {
                callback(event);
            }
        });

        let transport = Arc::clone(&self.transport);
        let task_cancel = cancel.clone();
        let task_topic = topic.clone();
        tokio::spawn(async move {
            let result = transport.subscribe(&task_topic, handler).await;
            let id = match result {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(topic = %task_topic, error = %e, "Realtime subscribe failed");
                    state_tx.send_replace(SubscriptionState::Failed(e.to_string()));
                    return;
                }
            };

            if task_cancel.is_cancelled() {
                tracing::debug!(topic = %task_topic, "Guard released before subscribe completed");
            } else {
                state_tx.send_replace(SubscriptionState::Active);
                tracing::debug!(topic = %task_topic, subscription_id = id, "Realtime subscription active");
                task_cancel.cancelled().await;
            }

            if let Err(e) = transport.unsubscribe(id).await {
                tracing::warn!(topic = %task_topic, error = %e, "Realtime unsubscribe failed");
            }
            state_tx.send_replace(SubscriptionState::Closed);
        });

        Subscription {
            topic,
            cancel,
            state: state_rx,
        }
    }
}

/// Guard owning one realtime registration.
pub struct Subscription {
    topic: String,
    cancel: CancellationToken,
    state: watch::Receiver<SubscriptionState>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Resolve once the subscription has left [`SubscriptionState::Pending`].
    pub async fn ready(&mut self) -> SubscriptionState {
        match self
            .state
            .wait_for(|s| *s != SubscriptionState::Pending)
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => SubscriptionState::Closed,
        }
    }

    /// Release the registration and wait for the transport to confirm.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        let _ = self
            .state
            .wait_for(|s| matches!(s, SubscriptionState::Closed | SubscriptionState::Failed(_)))
            .await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
