//! The seam between subscription guards and a concrete realtime backend.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RealtimeError;
use crate::event::RecordEvent;

/// Callback invoked for each event on a topic.
pub type EventHandler = Arc<dyn Fn(RecordEvent) + Send + Sync>;

/// Identifies one registration with a transport.
pub type SubscriptionId = u64;

/// A backend able to deliver record events for topics.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Register `handler` for `topic`. Resolves once the server has
    /// accepted the registration.
    async fn subscribe(
        &self,
        topic: &str,
        handler: EventHandler,
    ) -> Result<SubscriptionId, RealtimeError>;

    /// Release a registration. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), RealtimeError>;
}
