//! PocketBase realtime transport over server-sent events.
//!
//! Protocol:
//! 1. `GET {base}/api/realtime` opens an event stream; the first frame is
//!    `PB_CONNECT` carrying `{"clientId": "..."}`.
//! 2. `POST {base}/api/realtime` with `{"clientId", "subscriptions": [..]}`
//!    replaces the full topic set of that client.
//! 3. Each change arrives as a frame whose event name is the topic and whose
//!    data is `{"action", "record"}`.
//!
//! A dropped stream is reopened with exponential backoff and every live
//! topic is registered again under the new client id.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::RealtimeError;
use crate::event::RecordEvent;
use crate::reconnect::{reconnect_loop, ReconnectConfig};
use crate::sse::{SseFrame, SseParser};
use crate::transport::{EventHandler, RealtimeTransport, SubscriptionId};

/// Event name of the connection handshake frame.
pub const CONNECT_EVENT: &str = "PB_CONNECT";

/// Default time to wait for the handshake before a subscribe fails.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Realtime transport for a PocketBase server.
pub struct PocketBaseRealtime {
    shared: Arc<Shared>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

struct Shared {
    base_url: String,
    http: reqwest::Client,
    reconnect: ReconnectConfig,
    handshake_timeout: Duration,
    auth_token: RwLock<Option<String>>,
    registry: Mutex<Registry>,
    client_id: watch::Sender<Option<String>>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Registry {
    next_id: SubscriptionId,
    handlers: HashMap<SubscriptionId, (String, EventHandler)>,
}

impl Registry {
    fn topics(&self) -> BTreeSet<String> {
        self.handlers.values().map(|(t, _)| t.clone()).collect()
    }

    fn handlers_for(&self, topic: &str) -> Vec<EventHandler> {
        self.handlers
            .values()
            .filter(|(t, _)| t == topic)
            .map(|(_, h)| Arc::clone(h))
            .collect()
    }
}

impl PocketBaseRealtime {
    /// Create a transport for `base_url` (e.g. `http://localhost:8090`).
    /// The stream is opened lazily on the first subscribe.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, ReconnectConfig::default(), DEFAULT_HANDSHAKE_TIMEOUT)
    }

    pub fn with_config(
        base_url: impl Into<String>,
        reconnect: ReconnectConfig,
        handshake_timeout: Duration,
    ) -> Self {
        let (client_id, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                http: reqwest::Client::new(),
                reconnect,
                handshake_timeout,
                auth_token: RwLock::new(None),
                registry: Mutex::new(Registry::default()),
                client_id,
                cancel: CancellationToken::new(),
            }),
            task: Mutex::new(None),
        }
    }

    /// Token forwarded on topic registration so the server applies the
    /// caller's record access rules.
    pub fn set_auth_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.shared.auth_token.write() {
            *guard = token;
        }
    }

    /// Current handshake client id, if connected.
    pub fn client_id(&self) -> Option<String> {
        self.shared.client_id.borrow().clone()
    }

    /// Re-send the topic set, e.g. after the auth token changed.
    pub async fn refresh_subscriptions(&self) -> Result<(), RealtimeError> {
        let client_id = self.client_id();
        match client_id {
            Some(id) => self.shared.post_subscriptions(&id).await,
            None => Ok(()),
        }
    }

    /// Stop the stream task and wait up to 5 seconds for it to exit.
    pub async fn shutdown(&self) {
        tracing::info!(base_url = %self.shared.base_url, "Shutting down realtime transport");
        self.shared.cancel.cancel();
        let handle = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }

    fn ensure_started(&self) {
        let Ok(mut task) = self.task.lock() else {
            return;
        };
        if task.is_none() {
            let shared = Arc::clone(&self.shared);
            *task = Some(tokio::spawn(run_stream(shared)));
        }
    }

    async fn wait_for_client_id(&self) -> Result<String, RealtimeError> {
        let mut rx = self.shared.client_id.subscribe();
        let outcome = match tokio::time::timeout(
            self.shared.handshake_timeout,
            rx.wait_for(|id| id.is_some()),
        )
        .await
        {
            Ok(Ok(id)) => id.clone().ok_or(RealtimeError::Closed),
            Ok(Err(_)) => Err(RealtimeError::Closed),
            Err(_) => Err(RealtimeError::Timeout),
        };
        outcome
    }

    fn remove_handler(&self, id: SubscriptionId) -> bool {
        self.shared
            .registry
            .lock()
            .map(|mut r| r.handlers.remove(&id).is_some())
            .unwrap_or(false)
    }
}

impl Drop for PocketBaseRealtime {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

#[async_trait]
impl RealtimeTransport for PocketBaseRealtime {
    async fn subscribe(
        &self,
        topic: &str,
        handler: EventHandler,
    ) -> Result<SubscriptionId, RealtimeError> {
        if self.shared.cancel.is_cancelled() {
            return Err(RealtimeError::Closed);
        }
        self.ensure_started();

        let id = {
            let mut registry = self
                .shared
                .registry
                .lock()
                .map_err(|_| RealtimeError::Closed)?;
            registry.next_id += 1;
            let id = registry.next_id;
            registry.handlers.insert(id, (topic.to_string(), handler));
            id
        };

        let client_id = match self.wait_for_client_id().await {
            Ok(client_id) => client_id,
            Err(e) => {
                self.remove_handler(id);
                return Err(e);
            }
        };

        if let Err(e) = self.shared.post_subscriptions(&client_id).await {
            self.remove_handler(id);
            return Err(e);
        }

        tracing::debug!(topic, subscription_id = id, "Topic registered");
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), RealtimeError> {
        if !self.remove_handler(id) {
            return Ok(());
        }
        match self.client_id() {
            Some(client_id) => self.shared.post_subscriptions(&client_id).await,
            None => Ok(()),
        }
    }
}

impl Shared {
    fn realtime_url(&self) -> String {
        format!("{}/api/realtime", self.base_url)
    }

    async fn open_stream(&self) -> Result<reqwest::Response, RealtimeError> {
        let response = self
            .http
            .get(self.realtime_url())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RealtimeError::Connection(format!(
                "realtime stream returned {}",
                response.status()
            )));
        }
        Ok(response)
    }

    async fn post_subscriptions(&self, client_id: &str) -> Result<(), RealtimeError> {
        let topics: Vec<String> = self
            .registry
            .lock()
            .map(|r| r.topics().into_iter().collect())
            .unwrap_or_default();
        let body = serde_json::json!({ "clientId": client_id, "subscriptions": topics });

        let mut request = self.http.post(self.realtime_url()).json(&body);
        let token = self.auth_token.read().ok().and_then(|t| t.clone());
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RealtimeError::Subscribe(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RealtimeError::Subscribe(format!("HTTP {status}: {text}")));
        }
        tracing::debug!(client_id, topics = topics.len(), "Realtime topics posted");
        Ok(())
    }

    /// Read frames until the stream ends, errors or the transport is
    /// cancelled.
    async fn pump(&self, response: reqwest::Response) {
        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for frame in parser.feed(&bytes) {
                            self.handle_frame(frame).await;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Realtime stream read failed");
                        return;
                    }
                    None => return,
                },
            }
        }
    }

    async fn handle_frame(&self, frame: SseFrame) {
        if frame.event == CONNECT_EVENT {
            let client_id = serde_json::from_str::<serde_json::Value>(&frame.data)
                .ok()
                .and_then(|v| v.get("clientId").and_then(|c| c.as_str()).map(str::to_string))
                .or(frame.id);
            let Some(client_id) = client_id else {
                tracing::warn!("PB_CONNECT frame without client id");
                return;
            };
            tracing::info!(client_id = %client_id, "Realtime stream connected");

            let has_topics = self
                .registry
                .lock()
                .map(|r| !r.handlers.is_empty())
                .unwrap_or(false);
            if has_topics {
                if let Err(e) = self.post_subscriptions(&client_id).await {
                    tracing::warn!(error = %e, "Failed to restore realtime topics");
                }
            }
            self.client_id.send_replace(Some(client_id));
            return;
        }

        let event: RecordEvent = match serde_json::from_str(&frame.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(topic = %frame.event, error = %e, "Undecodable realtime event");
                return;
            }
        };
        let handlers = self
            .registry
            .lock()
            .map(|r| r.handlers_for(&frame.event))
            .unwrap_or_default();
        for handler in handlers {
            handler(event.clone());
        }
    }
}

/// Connection task: open, pump, and reopen with backoff until cancelled.
async fn run_stream(shared: Arc<Shared>) {
    let label = shared.realtime_url();
    let mut first_attempt = true;

    loop {
        let response = if first_attempt {
            first_attempt = false;
            match shared.open_stream().await {
                Ok(response) => Some(response),
                Err(e) => {
                    tracing::warn!(error = %e, "Realtime connect failed");
                    None
                }
            }
        } else {
            None
        };

        let response = match response {
            Some(response) => response,
            None => {
                let reopened = reconnect_loop(&label, &shared.reconnect, &shared.cancel, || {
                    let shared = Arc::clone(&shared);
                    async move { shared.open_stream().await }
                })
                .await;
                match reopened {
                    Some(response) => response,
                    None => return,
                }
            }
        };

        shared.pump(response).await;
        shared.client_id.send_replace(None);

        if shared.cancel.is_cancelled() {
            return;
        }
        tracing::warn!(url = %label, "Realtime stream closed");
    }
}
