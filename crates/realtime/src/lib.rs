//! Realtime record-change subscriptions for the StudioAI client.
//!
//! Provides the PocketBase server-sent-events transport, the SSE frame
//! parser, reconnection backoff, and the [`RealtimeBridge`] whose
//! [`Subscription`] guards own each server-side registration.

pub mod bridge;
pub mod error;
pub mod event;
pub mod pocketbase;
pub mod reconnect;
pub mod sse;
pub mod transport;

pub use bridge::{RealtimeBridge, Subscription, SubscriptionState};
pub use error::RealtimeError;
pub use event::{RecordAction, RecordEvent};
pub use pocketbase::PocketBaseRealtime;
pub use transport::{EventHandler, RealtimeTransport, SubscriptionId};
