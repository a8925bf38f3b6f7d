//! Keyed query cache with request deduplication
//!
//! A [`QueryClient`] owns one entry per [`QueryKey`]. Each entry keeps the
//! latest [`QueryState`], the function that fetches it, and the request
//! currently on the wire. Observers subscribe to an entry; structurally equal
//! keys always resolve to the same entry, so concurrent observers share a
//! single request.
//!
//! Fetches run as spawned tasks, which means they complete and populate the
//! cache even if every observer went away in the meantime. A fetch started
//! later supersedes an earlier one: the earlier result is still returned to
//! whoever awaited it, but it no longer touches the cached state.

use super::observer::QueryObserver;
use super::state::{FetchStatus, QueryState};
use crate::core::error::AdminError;
use crate::core::query_key::QueryKey;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Result of one fetch or mutation: raw JSON or a typed error
pub type QueryResult = Result<Value, AdminError>;

/// Function producing the data of one query key
pub type QueryFn = Arc<dyn Fn() -> BoxFuture<'static, QueryResult> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, QueryResult>>;

/// Defaults applied to every query that does not override them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClientConfig {
    /// How long fetched data counts as fresh
    pub stale_time: Duration,

    /// How long an unobserved entry survives garbage collection
    pub gc_time: Duration,

    pub retry: RetryPolicy,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Retry with exponential back-off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn never() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (starting at 0)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    async fn run(&self, key: &QueryKey, fetcher: &QueryFn) -> QueryResult {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.retries => {
                    let delay = self.delay(attempt);
                    tracing::debug!(key = %key, attempt, ?delay, error = %error, "retrying query");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Per-query overrides of the client defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Disabled observers subscribe without fetching
    pub enabled: bool,
    pub stale_time: Option<Duration>,
    pub gc_time: Option<Duration>,
    pub retry: Option<u32>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: None,
            gc_time: None,
            retry: None,
        }
    }
}

struct Entry {
    state: tokio::sync::watch::Sender<QueryState>,
    fetcher: Option<QueryFn>,
    in_flight: Option<SharedFetch>,
    fetch_id: u64,
    stale_time: Duration,
    gc_time: Duration,
    retry: RetryPolicy,
    observers: usize,
    active_observers: usize,
    last_used: Instant,
}

impl Entry {
    fn new(config: &QueryClientConfig) -> Self {
        let (state, _) = tokio::sync::watch::channel(QueryState::default());
        Self {
            state,
            fetcher: None,
            in_flight: None,
            fetch_id: 0,
            stale_time: config.stale_time,
            gc_time: config.gc_time,
            retry: config.retry,
            observers: 0,
            active_observers: 0,
            last_used: Instant::now(),
        }
    }

    fn configure(&mut self, fetcher: QueryFn, options: &QueryOptions, config: &QueryClientConfig) {
        self.fetcher = Some(fetcher);
        self.stale_time = options.stale_time.unwrap_or(config.stale_time);
        // the longest gc time requested by any observer wins
        self.gc_time = self.gc_time.max(options.gc_time.unwrap_or(config.gc_time));
        self.retry.retries = options.retry.unwrap_or(config.retry.retries);
        self.last_used = Instant::now();
    }

    fn needs_fetch(&self, now: Instant) -> bool {
        let state = self.state.borrow();
        match (&state.data, state.data_updated_at) {
            (Some(_), Some(updated)) => {
                state.is_invalidated || now.saturating_duration_since(updated) >= self.stale_time
            }
            _ => true,
        }
    }

    fn data(&self) -> Option<Value> {
        self.state.borrow().data.clone()
    }
}

struct ClientInner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    config: QueryClientConfig,
    next_fetch_id: AtomicU64,
}

/// Shared query cache
///
/// Cheap to clone; all clones see the same entries. Methods that start a
/// fetch must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_config(QueryClientConfig::default())
    }

    pub fn with_config(config: QueryClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                entries: Mutex::new(HashMap::new()),
                config,
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &QueryClientConfig {
        &self.inner.config
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `key`, fetching it if it is enabled and not fresh
    ///
    /// If a request for the key is already on the wire the observer joins it
    /// instead of sending another one.
    pub fn observe(&self, key: QueryKey, fetcher: QueryFn, options: QueryOptions) -> QueryObserver {
        let receiver = {
            let mut entries = self.entries();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(&self.inner.config));

            entry.configure(fetcher, &options, &self.inner.config);
            entry.observers += 1;
            if options.enabled {
                entry.active_observers += 1;
            }

            let receiver = entry.state.subscribe();
            if options.enabled && entry.needs_fetch(Instant::now()) {
                self.start_fetch(&mut entries, &key, false);
            }
            receiver
        };

        QueryObserver::new(self.clone(), key, options.enabled, receiver)
    }

    /// Fetch `key` imperatively, returning cached data when it is still fresh
    pub async fn fetch_query(&self, key: QueryKey, fetcher: QueryFn, options: QueryOptions) -> QueryResult {
        let fetch = {
            let mut entries = self.entries();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(&self.inner.config));
            entry.configure(fetcher, &options, &self.inner.config);

            if !entry.needs_fetch(Instant::now()) {
                if let Some(data) = entry.data() {
                    tracing::debug!(key = %key, "serving fresh query from cache");
                    return Ok(data);
                }
            }
            self.start_fetch(&mut entries, &key, false)
        };

        match fetch {
            Some(fetch) => fetch.await,
            None => Err(AdminError::Internal(format!("no fetcher registered for {key}"))),
        }
    }

    /// Force a new request for `key`, superseding any request on the wire
    pub async fn refetch(&self, key: &QueryKey) -> QueryResult {
        let fetch = {
            let mut entries = self.entries();
            self.start_fetch(&mut entries, key, true)
        };

        match fetch {
            Some(fetch) => fetch.await,
            None => Err(AdminError::Internal(format!("no query registered for {key}"))),
        }
    }

    /// Mark every entry under `prefix` stale and refetch the observed ones
    ///
    /// Resolves once the triggered refetches have settled. Returns the number
    /// of refetches started; unobserved entries are only marked and refetch
    /// on their next subscription.
    pub async fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let fetches: Vec<SharedFetch> = {
            let mut entries = self.entries();
            let matching: Vec<QueryKey> = entries
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect();

            let mut fetches = Vec::new();
            for key in matching {
                let observed = match entries.get(&key) {
                    Some(entry) => {
                        entry.state.send_modify(|state| state.is_invalidated = true);
                        entry.active_observers > 0
                    }
                    None => false,
                };
                if observed {
                    fetches.extend(self.start_fetch(&mut entries, &key, true));
                }
            }
            fetches
        };

        let refetched = fetches.len();
        tracing::debug!(prefix = %prefix, refetched, "invalidated queries");
        futures::future::join_all(fetches).await;
        refetched
    }

    /// Drop every entry under `prefix`
    pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn get_query_state(&self, key: &QueryKey) -> Option<QueryState> {
        self.entries()
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<Value> {
        self.entries().get(key).and_then(Entry::data)
    }

    /// Number of observers currently subscribed to `key`
    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.entries().get(key).map_or(0, |entry| entry.observers)
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict entries nobody observed for longer than their gc time
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();

        entries.retain(|key, entry| {
            let expired = entry.observers == 0
                && entry.in_flight.is_none()
                && now.saturating_duration_since(entry.last_used) >= entry.gc_time;
            if expired {
                tracing::debug!(key = %key, "evicting unused query");
            }
            !expired
        });

        before - entries.len()
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `interval`
    ///
    /// The task holds a weak reference and stops once the last clone of the
    /// client is dropped.
    pub fn spawn_garbage_collector(&self, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let evicted = QueryClient { inner }.collect_garbage();
                if evicted > 0 {
                    tracing::debug!(evicted, "query garbage collection");
                }
            }
        })
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub(crate) fn detach(&self, key: &QueryKey, enabled: bool) {
        if let Some(entry) = self.entries().get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            if enabled {
                entry.active_observers = entry.active_observers.saturating_sub(1);
            }
            entry.last_used = Instant::now();
        }
    }

    fn start_fetch(
        &self,
        entries: &mut HashMap<QueryKey, Entry>,
        key: &QueryKey,
        force: bool,
    ) -> Option<SharedFetch> {
        let entry = entries.get_mut(key)?;
        if !force {
            if let Some(in_flight) = &entry.in_flight {
                tracing::debug!(key = %key, "joining in-flight query");
                return Some(in_flight.clone());
            }
        }

        let fetcher = entry.fetcher.clone()?;
        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let retry = entry.retry;
        entry.fetch_id = fetch_id;
        entry.state.send_modify(|state| state.fetch_status = FetchStatus::Fetching);
        tracing::debug!(key = %key, fetch_id, "fetching query");

        let weak = Arc::downgrade(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let result = retry.run(&task_key, &fetcher).await;
            if let Some(inner) = weak.upgrade() {
                QueryClient { inner }.complete_fetch(&task_key, fetch_id, &result);
            }
            result
        });

        let shared = async move {
            task.await
                .unwrap_or_else(|e| Err(AdminError::Internal(format!("query task failed: {e}"))))
        }
        .boxed()
        .shared();

        entry.in_flight = Some(shared.clone());
        Some(shared)
    }

    fn complete_fetch(&self, key: &QueryKey, fetch_id: u64, result: &QueryResult) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.fetch_id != fetch_id {
            tracing::debug!(key = %key, fetch_id, "ignoring superseded query result");
            return;
        }

        entry.in_flight = None;
        if let Err(error) = result {
            tracing::warn!(key = %key, error = %error, "query failed");
        }
        entry.state.send_modify(|state| state.resolve(result));
    }
}
