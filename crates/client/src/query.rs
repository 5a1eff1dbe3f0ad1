//! Keyed read cache with request de-duplication.
//!
//! Every read is addressed by a [`QueryKey`]. One cache entry exists per
//! key; concurrent readers of the same key share a single in-flight fetch.
//! Fetches run as spawned tasks, so dropping a reader abandons the wait but
//! never aborts the request.
//!
//! Each fetch is stamped with a generation taken from a client-wide counter.
//! A result is applied only if its generation is still the latest one
//! issued for the key; anything older is discarded on arrival.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::keys::QueryKey;

/// Default freshness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

/// How long an unobserved entry stays cached.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Pause before the single retry of a failed read.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Type-erased cached value.
pub type AnyData = Arc<dyn Any + Send + Sync>;

type FetchResult = Result<AnyData, ClientError>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, FetchResult>>;

/// Per-query behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Overrides the client-wide stale time.
    pub stale_time: Option<Duration>,
    /// Poll while observed and visible.
    pub refetch_interval: Option<Duration>,
    /// Extra attempts for retryable failures.
    pub retry: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: None,
            refetch_interval: None,
            retry: 1,
        }
    }
}

impl QueryOptions {
    pub fn polling(interval: Duration) -> Self {
        Self {
            refetch_interval: Some(interval),
            ..Self::default()
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

/// Client-wide cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    pub stale_time: Duration,
    pub gc_time: Duration,
    pub retry_delay: Duration,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Clone, Default)]
struct RawSnapshot {
    data: Option<AnyData>,
    error: Option<ClientError>,
    updated_at: Option<Instant>,
    is_fetching: bool,
    invalidated: bool,
}

/// Typed view of one cache entry.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
    pub data: Option<Arc<T>>,
    /// Error of the most recent fetch; cleared by the next success.
    pub error: Option<ClientError>,
    pub updated_at: Option<Instant>,
    pub is_fetching: bool,
    pub is_invalidated: bool,
}

impl<T> Clone for QuerySnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_fetching: self.is_fetching,
            is_invalidated: self.is_invalidated,
        }
    }
}

impl<T> QuerySnapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }
}

fn typed<T: Send + Sync + 'static>(raw: &RawSnapshot) -> QuerySnapshot<T> {
    QuerySnapshot {
        data: raw.data.clone().and_then(|d| d.downcast::<T>().ok()),
        error: raw.error.clone(),
        updated_at: raw.updated_at,
        is_fetching: raw.is_fetching,
        is_invalidated: raw.invalidated,
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> Result<Arc<T>, ClientError> {
    data.downcast::<T>()
        .map_err(|_| ClientError::Decode(format!("Cached value for {key} has an unexpected type")))
}

// ---------------------------------------------------------------------------
// Cache entries
// ---------------------------------------------------------------------------

struct Entry {
    data: Option<AnyData>,
    error: Option<ClientError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    /// Latest generation issued for this key.
    issued: u64,
    in_flight: Option<InFlight>,
    observers: usize,
    unobserved_since: Option<Instant>,
    fetcher: Option<Fetcher>,
    options: QueryOptions,
    tx: watch::Sender<RawSnapshot>,
}

impl Entry {
    fn new(now: Instant) -> Self {
        let (tx, _rx) = watch::channel(RawSnapshot::default());
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            issued: 0,
            in_flight: None,
            observers: 0,
            unobserved_since: Some(now),
            fetcher: None,
            options: QueryOptions::default(),
            tx,
        }
    }

    fn is_fresh(&self, default_stale: Duration, now: Instant) -> bool {
        if self.invalidated {
            return false;
        }
        let stale_time = self.options.stale_time.unwrap_or(default_stale);
        self.updated_at
            .is_some_and(|t| now.duration_since(t) < stale_time)
    }

    fn reset(&mut self, generation: u64) {
        self.data = None;
        self.error = None;
        self.updated_at = None;
        self.invalidated = false;
        self.issued = generation;
        self.in_flight = None;
    }

    fn publish(&self) {
        self.tx.send_replace(RawSnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_fetching: self.in_flight.is_some(),
            invalidated: self.invalidated,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Serve fresh data from cache, join an in-flight fetch, or start one.
    IfStale,
    /// Join an in-flight fetch or start one, ignoring freshness.
    Refetch,
    /// Always start a new generation.
    Force,
}

enum Step {
    Cached(AnyData),
    Wait(InFlight),
    Fail(ClientError),
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    generation: AtomicU64,
    settings: QuerySettings,
    visible: watch::Sender<bool>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn apply(&self, key: &QueryKey, generation: u64, result: &FetchResult) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            tracing::debug!(key = %key, "Dropping result for evicted query");
            return;
        };
        if entry.issued != generation {
            tracing::debug!(
                key = %key,
                generation,
                latest = entry.issued,
                "Discarding superseded query result"
            );
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.error = None;
                entry.updated_at = Some(Instant::now());
                entry.invalidated = false;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Query failed");
                entry.error = Some(e.clone());
            }
        }
        entry.publish();
    }
}

async fn run_with_retry(
    key: &QueryKey,
    fetcher: &Fetcher,
    retry: u32,
    retry_delay: Duration,
) -> FetchResult {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < retry && e.is_retryable() => {
                attempt += 1;
                tracing::debug!(key = %key, attempt, error = %e, "Retrying query");
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// QueryClient
// ---------------------------------------------------------------------------

/// Shared handle to the cache. Cheap to clone.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QuerySettings::default())
    }
}

impl QueryClient {
    pub fn new(settings: QuerySettings) -> Self {
        let (visible, _rx) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                settings,
                visible,
            }),
        }
    }

    pub fn settings(&self) -> QuerySettings {
        self.inner.settings
    }

    /// Bind a key to a fetcher. Nothing is requested until the returned
    /// [`Query`] is fetched or observed.
    pub fn query<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetch: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map(|value| Arc::new(value) as AnyData) }.boxed()
        });
        Query {
            client: self.clone(),
            key,
            options,
            fetcher,
            _marker: PhantomData,
        }
    }

    /// Plan a fetch under the lock. Any new request is spawned before the
    /// lock is released.
    fn begin(&self, key: &QueryKey, mode: FetchMode, source: Option<(Fetcher, QueryOptions)>) -> Step {
        let mut entries = self.inner.lock();
        let now = Instant::now();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        if let Some((fetcher, options)) = source {
            entry.fetcher = Some(fetcher);
            entry.options = options;
        }

        if mode == FetchMode::IfStale && entry.is_fresh(self.inner.settings.stale_time, now) {
            if let Some(data) = &entry.data {
                return Step::Cached(data.clone());
            }
        }
        if mode != FetchMode::Force {
            if let Some(in_flight) = &entry.in_flight {
                return Step::Wait(in_flight.clone());
            }
        }
        let Some(fetcher) = entry.fetcher.clone() else {
            return match &entry.data {
                Some(data) => Step::Cached(data.clone()),
                None => Step::Fail(ClientError::NotFound(format!("No query registered for {key}"))),
            };
        };

        let generation = self.inner.next_generation();
        entry.issued = generation;
        let in_flight = self.spawn_fetch(key.clone(), generation, fetcher, entry.options.retry);
        entry.in_flight = Some(in_flight.clone());
        entry.publish();
        Step::Wait(in_flight)
    }

    fn spawn_fetch(&self, key: QueryKey, generation: u64, fetcher: Fetcher, retry: u32) -> InFlight {
        let inner = Arc::clone(&self.inner);
        let retry_delay = self.inner.settings.retry_delay;
        tracing::debug!(key = %key, generation, "Fetching query");
        let handle = tokio::spawn(async move {
            let result = run_with_retry(&key, &fetcher, retry, retry_delay).await;
            inner.apply(&key, generation, &result);
            result
        });
        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ClientError::Transport(format!("Query task failed: {e}"))))
        }
        .boxed()
        .shared()
    }

    async fn fetch_raw(
        &self,
        key: &QueryKey,
        mode: FetchMode,
        source: Option<(Fetcher, QueryOptions)>,
    ) -> FetchResult {
        match self.begin(key, mode, source) {
            Step::Cached(data) => Ok(data),
            Step::Wait(in_flight) => in_flight.await,
            Step::Fail(e) => Err(e),
        }
    }

    /// Mark every key under `prefix` stale. Observed keys are refetched
    /// before this returns; unobserved ones refetch on their next read.
    /// Returns the number of matched entries.
    pub async fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let (matched, observed) = {
            let mut entries = self.inner.lock();
            let mut matched = 0;
            let mut observed = Vec::new();
            for (key, entry) in entries.iter_mut() {
                if !key.starts_with(prefix) {
                    continue;
                }
                matched += 1;
                entry.invalidated = true;
                entry.publish();
                if entry.observers > 0 && entry.fetcher.is_some() {
                    observed.push(key.clone());
                }
            }
            (matched, observed)
        };

        tracing::debug!(prefix = %prefix, matched, refetching = observed.len(), "Invalidated queries");
        let refetches = observed
            .iter()
            .map(|key| self.fetch_raw(key, FetchMode::Force, None));
        futures::future::join_all(refetches).await;
        matched
    }

    /// Start a new fetch for every key under `prefix` that has a fetcher,
    /// observed or not, and wait for all of them.
    pub async fn refetch_queries(&self, prefix: &QueryKey) {
        let keys: Vec<QueryKey> = self
            .inner
            .lock()
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.fetcher.is_some())
            .map(|(key, _)| key.clone())
            .collect();
        let refetches = keys
            .iter()
            .map(|key| self.fetch_raw(key, FetchMode::Force, None));
        futures::future::join_all(refetches).await;
    }

    /// Write `value` as fresh data. Supersedes any fetch in flight.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let mut entries = self.inner.lock();
        let now = Instant::now();
        let generation = self.inner.next_generation();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.issued = generation;
        entry.in_flight = None;
        entry.data = Some(Arc::new(value));
        entry.error = None;
        entry.updated_at = Some(now);
        entry.invalidated = false;
        entry.publish();
    }

    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let data = self.inner.lock().get(key)?.data.clone()?;
        data.downcast::<T>().ok()
    }

    /// Whether the entry would be refetched on its next read.
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        let entries = self.inner.lock();
        let entry = entries.get(key)?;
        Some(!entry.is_fresh(self.inner.settings.stale_time, Instant::now()))
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry under `prefix`. Entries that still have observers
    /// are reset to empty and refetched instead of being removed.
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut matched = 0;
        let mut refetch = Vec::new();
        {
            let mut entries = self.inner.lock();
            entries.retain(|key, entry| {
                if !key.starts_with(prefix) {
                    return true;
                }
                matched += 1;
                if entry.observers == 0 {
                    return false;
                }
                entry.reset(self.inner.next_generation());
                entry.publish();
                if entry.fetcher.is_some() {
                    refetch.push(key.clone());
                }
                true
            });
        }

        tracing::debug!(prefix = %prefix, matched, refetching = refetch.len(), "Removed queries");
        for key in refetch {
            let _ = self.begin(&key, FetchMode::Force, None);
        }
        matched
    }

    /// Evict entries that have had no observer for longer than `gc_time`.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.inner.settings.gc_time;
        let now = Instant::now();
        let mut entries = self.inner.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            let expired = entry.observers == 0
                && entry.in_flight.is_none()
                && entry
                    .unobserved_since
                    .is_some_and(|since| now.duration_since(since) >= gc_time);
            !expired
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Collected unobserved queries");
        }
        evicted
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `every` until
    /// `cancel` fires. Long-running hosts spawn this next to their observers.
    pub async fn gc_loop(self, every: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(every) => {}
            }
            self.collect_garbage();
        }
        tracing::debug!("Query GC stopped");
    }

    /// Pause (`false`) or resume (`true`) interval polling.
    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.send_replace(visible);
    }

    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    fn attach(&self, key: &QueryKey, fetcher: Fetcher, options: QueryOptions) -> watch::Receiver<RawSnapshot> {
        let mut entries = self.inner.lock();
        let now = Instant::now();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.fetcher = Some(fetcher);
        entry.options = options;
        entry.observers += 1;
        entry.unobserved_since = None;
        entry.tx.subscribe()
    }

    fn detach(&self, key: &QueryKey) {
        let mut entries = self.inner.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            if entry.observers == 0 {
                entry.unobserved_since = Some(Instant::now());
            }
        }
    }

    async fn poll_loop(self, key: QueryKey, interval: Duration, cancel: CancellationToken) {
        let mut visible = self.inner.visible.subscribe();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            if !*visible.borrow_and_update() {
                tracing::debug!(key = %key, "Polling paused");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    resumed = visible.wait_for(|v| *v) => {
                        if resumed.is_err() {
                            break;
                        }
                    }
                }
            }
            if let Err(e) = self.fetch_raw(&key, FetchMode::Refetch, None).await {
                tracing::debug!(key = %key, error = %e, "Poll fetch failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Query / QueryObserver
// ---------------------------------------------------------------------------

/// A key bound to its fetcher and options.
pub struct Query<T> {
    client: QueryClient,
    key: QueryKey,
    options: QueryOptions,
    fetcher: Fetcher,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            key: self.key.clone(),
            options: self.options,
            fetcher: self.fetcher.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Cached data if fresh, otherwise the (shared) result of a fetch.
    pub async fn fetch(&self) -> Result<Arc<T>, ClientError> {
        let source = Some((self.fetcher.clone(), self.options));
        let data = self.client.fetch_raw(&self.key, FetchMode::IfStale, source).await?;
        downcast(&self.key, data)
    }

    /// Subscribe to the entry. Starts a fetch if the entry is stale and,
    /// with `refetch_interval`, polls until the observer is dropped.
    pub fn observe(&self) -> QueryObserver<T> {
        let rx = self
            .client
            .attach(&self.key, self.fetcher.clone(), self.options);
        let _ = self.client.begin(&self.key, FetchMode::IfStale, None);

        let cancel = CancellationToken::new();
        if let Some(interval) = self.options.refetch_interval {
            tokio::spawn(
                self.client
                    .clone()
                    .poll_loop(self.key.clone(), interval, cancel.clone()),
            );
        }

        QueryObserver {
            client: self.client.clone(),
            key: self.key.clone(),
            rx,
            cancel,
            _marker: PhantomData,
        }
    }
}

/// A live subscription to one cache entry. Dropping it stops polling and
/// releases the entry for garbage collection.
pub struct QueryObserver<T> {
    client: QueryClient,
    key: QueryKey,
    rx: watch::Receiver<RawSnapshot>,
    cancel: CancellationToken,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn snapshot(&self) -> QuerySnapshot<T> {
        typed(&self.rx.borrow())
    }

    /// Wait for the next change. `None` once the entry is gone.
    pub async fn changed(&mut self) -> Option<QuerySnapshot<T>> {
        self.rx.changed().await.ok()?;
        Some(typed(&self.rx.borrow_and_update()))
    }

    /// Wait until `predicate` holds for the current snapshot.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&QuerySnapshot<T>) -> bool,
    ) -> Option<QuerySnapshot<T>> {
        let raw = self
            .rx
            .wait_for(|raw| predicate(&typed(raw)))
            .await
            .ok()?
            .clone();
        Some(typed(&raw))
    }

    /// Wait for the first settled outcome: data, or an error with no fetch
    /// still running.
    pub async fn data(&mut self) -> Result<Arc<T>, ClientError> {
        let snapshot = self
            .wait_for(|s| s.data.is_some() || (s.error.is_some() && !s.is_fetching))
            .await
            .ok_or_else(|| ClientError::NotFound(format!("Query {} was removed", self.key)))?;
        match (snapshot.data, snapshot.error) {
            (Some(data), _) => Ok(data),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ClientError::NotFound(format!("Query {} has no data", self.key))),
        }
    }

    /// Refetch now, joining a fetch already in flight.
    pub async fn refetch(&self) -> Result<Arc<T>, ClientError> {
        let data = self
            .client
            .fetch_raw(&self.key, FetchMode::Refetch, None)
            .await?;
        downcast(&self.key, data)
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.client.detach(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::Notify;

    use super::*;
    use crate::keys;

    fn settings() -> QuerySettings {
        QuerySettings {
            retry_delay: Duration::from_millis(10),
            ..QuerySettings::default()
        }
    }

    fn counting_query(
        client: &QueryClient,
        key: QueryKey,
        calls: Arc<AtomicUsize>,
    ) -> Query<usize> {
        client.query(key, QueryOptions::default(), move || {
            let calls = calls.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
            }
        })
    }

    // ---- Test: de-duplication ----

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&client, keys::shows("w1"), calls.clone());

        let (a, b, c) = tokio::join!(query.fetch(), query.fetch(), query.fetch());
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(*c.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Fresh data is served from cache.
        assert_eq!(*query.fetch().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ---- Test: last write wins ----

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let key = keys::episode("w1", "s1", "e1");

        let query = {
            let calls = calls.clone();
            let gate = gate.clone();
            client.query(key.clone(), QueryOptions::default(), move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                let gate = gate.clone();
                async move {
                    if n == 0 {
                        gate.notified().await;
                        Ok("old".to_string())
                    } else {
                        Ok("new".to_string())
                    }
                }
            })
        };

        let slow = tokio::spawn({
            let query = query.clone();
            async move { query.fetch().await }
        });
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        client.refetch_queries(&key).await;
        assert_eq!(client.get_query_data::<String>(&key).unwrap().as_str(), "new");

        gate.notify_one();
        assert_eq!(slow.await.unwrap().unwrap().as_str(), "old");
        assert_eq!(client.get_query_data::<String>(&key).unwrap().as_str(), "new");
    }

    #[tokio::test]
    async fn test_observer_mounted_mid_refetch_sees_only_latest() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let first_gate = Arc::new(Notify::new());
        let second_gate = Arc::new(Notify::new());
        let key = keys::episode("w1", "s1", "e1");

        let query = {
            let calls = calls.clone();
            let first_gate = first_gate.clone();
            let second_gate = second_gate.clone();
            client.query(key.clone(), QueryOptions::default(), move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                let gate = if n == 0 { first_gate.clone() } else { second_gate.clone() };
                async move {
                    gate.notified().await;
                    Ok(if n == 0 { "v1".to_string() } else { "v2".to_string() })
                }
            })
        };

        let slow = tokio::spawn({
            let query = query.clone();
            async move { query.fetch().await }
        });
        while calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        let refetch = tokio::spawn({
            let client = client.clone();
            let key = key.clone();
            async move { client.refetch_queries(&key).await }
        });
        while calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Mounting joins the newest fetch instead of starting another.
        let mut observer = query.observe();
        assert!(observer.snapshot().is_loading());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let seen = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(snapshot) = observer.changed().await {
                if let Some(data) = snapshot.data {
                    let value = data.to_string();
                    if seen.last() != Some(&value) {
                        seen.push(value);
                    }
                    if seen.last().map(String::as_str) == Some("v2") {
                        break;
                    }
                }
            }
            seen
        });

        first_gate.notify_one();
        assert_eq!(slow.await.unwrap().unwrap().as_str(), "v1");
        assert!(client.get_query_data::<String>(&key).is_none());

        second_gate.notify_one();
        refetch.await.unwrap();
        let seen = tokio::time::timeout(Duration::from_secs(2), seen)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, vec!["v2".to_string()]);
    }

    // ---- Test: invalidation ----

    #[tokio::test]
    async fn test_unobserved_invalidation_is_lazy() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&client, keys::shows("w1"), calls.clone());
        query.fetch().await.unwrap();

        assert_eq!(client.invalidate_queries(&keys::family("shows")).await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.is_stale(query.key()), Some(true));

        assert_eq!(*query.fetch().await.unwrap(), 2);
        assert_eq!(client.is_stale(query.key()), Some(false));
    }

    #[tokio::test]
    async fn test_observed_invalidation_refetches_immediately() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&client, keys::shows("w1"), calls.clone());
        let mut observer = query.observe();
        assert_eq!(*observer.data().await.unwrap(), 1);

        client.invalidate_queries(&keys::shows("w1")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*observer.snapshot().data.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalidation_leaves_other_prefixes_alone() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let shows = counting_query(&client, keys::shows("w1"), calls.clone());
        let other = counting_query(&client, keys::shows("w2"), calls.clone());
        shows.fetch().await.unwrap();
        other.fetch().await.unwrap();

        client.invalidate_queries(&keys::shows("w1")).await;
        assert_eq!(client.is_stale(shows.key()), Some(true));
        assert_eq!(client.is_stale(other.key()), Some(false));
    }

    // ---- Test: retry ----

    #[tokio::test]
    async fn test_retryable_error_is_retried_once() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = {
            let calls = calls.clone();
            client.query(keys::pipeline("w1"), QueryOptions::default(), move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ClientError::Transport("connection reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
        };
        assert_eq!(*query.fetch().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query: Query<()> = {
            let calls = calls.clone();
            client.query(keys::show("w1", "missing"), QueryOptions::default(), move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::NotFound("Show not found".into())) }
            })
        };
        assert!(matches!(query.fetch().await, Err(ClientError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_one_extra_attempt() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query: Query<()> = {
            let calls = calls.clone();
            client.query(keys::pipeline_health(), QueryOptions::default(), move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ClientError::Api {
                        status: 503,
                        code: None,
                        message: "down".into(),
                    })
                }
            })
        };
        assert!(query.fetch().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // ---- Test: manual cache writes ----

    #[tokio::test]
    async fn test_set_query_data_is_fresh() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&client, keys::workspace("w1"), calls.clone());

        client.set_query_data(query.key(), 42usize);
        assert_eq!(*query.fetch().await.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.get_query_data::<String>(query.key()), None);
    }

    // ---- Test: removal and garbage collection ----

    #[tokio::test]
    async fn test_remove_drops_unobserved_and_resets_observed() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let observed = counting_query(&client, keys::shows("w1"), calls.clone());
        let cold = counting_query(&client, keys::voice_actors("w1"), calls.clone());

        let mut observer = observed.observe();
        observer.data().await.unwrap();
        cold.fetch().await.unwrap();

        client.remove_queries(&keys::family("voice-actors"));
        assert!(!client.contains(cold.key()));

        client.remove_queries(&keys::family("shows"));
        assert!(client.contains(observed.key()));
        let refreshed = observer.wait_for(|s| s.data.is_some()).await.unwrap();
        assert_eq!(*refreshed.data.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gc_evicts_only_long_unobserved_entries() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let cold = counting_query(&client, keys::shows("w1"), calls.clone());
        let hot = counting_query(&client, keys::shows("w2"), calls.clone());
        cold.fetch().await.unwrap();
        let mut observer = hot.observe();
        observer.data().await.unwrap();

        assert_eq!(client.collect_garbage(), 0);
        tokio::time::advance(DEFAULT_GC_TIME).await;
        assert_eq!(client.collect_garbage(), 1);
        assert!(!client.contains(cold.key()));
        assert!(client.contains(hot.key()));

        drop(observer);
        tokio::time::advance(DEFAULT_GC_TIME).await;
        assert_eq!(client.collect_garbage(), 1);
        assert!(client.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gc_loop_evicts_on_its_own() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let cold = counting_query(&client, keys::shows("w1"), calls);
        cold.fetch().await.unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(client.clone().gc_loop(Duration::from_secs(60), cancel.clone()));

        tokio::time::sleep(DEFAULT_GC_TIME + Duration::from_secs(61)).await;
        assert!(!client.contains(cold.key()));

        cancel.cancel();
        task.await.unwrap();
    }

    // ---- Test: polling ----

    #[tokio::test(start_paused = true)]
    async fn test_polling_pauses_while_hidden() {
        let client = QueryClient::new(settings());
        let calls = Arc::new(AtomicUsize::new(0));
        let query = counting_query(&client, keys::pipeline("w1"), calls.clone())
            .with_options(QueryOptions::polling(Duration::from_secs(10)));

        let mut observer = query.observe();
        observer.data().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        client.set_visible(false);
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        client.set_visible(true);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(observer);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
