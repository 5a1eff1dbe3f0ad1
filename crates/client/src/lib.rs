//! StudioAI client SDK.
//!
//! [`StudioClient`] ties together the REST transport ([`api`]), the keyed
//! read cache ([`query`]), the write catalogue ([`mutation`]), and the
//! persisted client state ([`store`]). Reads and writes for each backend
//! resource live under [`resources`]; [`live`] keeps the cache in step with
//! realtime record changes.

pub mod api;
pub mod config;
pub mod error;
pub mod keys;
pub mod live;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod resources;
pub mod store;

use std::sync::Arc;

use studioai_core::files::{file_url, FileOwner};
use studioai_core::types::RecordId;

pub use crate::api::{ApiClient, Payload};
pub use crate::config::ClientConfig;
pub use crate::error::ClientError;
pub use crate::mutation::Mutation;
pub use crate::notify::{Notifier, RecordingNotifier, Toast, ToastKind, TracingNotifier};
pub use crate::query::{Query, QueryClient, QueryObserver, QueryOptions, QuerySettings, QuerySnapshot};
pub use crate::store::{Storage, Stores};

/// Entry point for applications.
#[derive(Clone)]
pub struct StudioClient {
    api: ApiClient,
    /// Direct reads from the document store's REST API.
    records: ApiClient,
    queries: QueryClient,
    stores: Stores,
    notifier: Arc<dyn Notifier>,
    config: ClientConfig,
    in_flight: mutation::InFlight,
}

impl StudioClient {
    /// Build a client over `storage`, restoring any persisted session.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let stores = Stores::new(storage);
        let api = ApiClient::new(
            config.api_url.clone(),
            config.request_timeout,
            stores.session.clone(),
        )?;
        let records = api.rebased(config.pb_url.clone());
        let queries = QueryClient::new(QuerySettings {
            stale_time: config.stale_time,
            ..QuerySettings::default()
        });
        Ok(Self {
            api,
            records,
            queries,
            stores,
            notifier: Arc::new(TracingNotifier),
            config,
            in_flight: mutation::InFlight::default(),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the cache with one using `settings`. Cached data is dropped.
    pub fn with_query_settings(mut self, settings: QuerySettings) -> Self {
        self.queries = QueryClient::new(settings);
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Id of the active workspace, or [`ClientError::NoWorkspace`].
    pub fn workspace_id(&self) -> Result<RecordId, ClientError> {
        self.stores
            .workspace
            .active_workspace_id()
            .ok_or(ClientError::NoWorkspace)
    }

    /// Public URL of a stored file, served by PocketBase.
    pub fn file_url(&self, owner: FileOwner<'_>, filename: Option<&str>, thumb: Option<&str>) -> Option<String> {
        file_url(&self.config.pb_url, owner, filename, thumb)
    }
}
