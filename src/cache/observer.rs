//! Live subscription to one cached query

use super::client::{QueryClient, QueryResult};
use super::state::QueryState;
use crate::core::query_key::QueryKey;
use tokio::sync::watch;

/// Subscription returned by [`QueryClient::observe`]
///
/// Dropping the observer unsubscribes it; the entry then becomes eligible for
/// garbage collection once its gc time has passed.
pub struct QueryObserver {
    client: QueryClient,
    key: QueryKey,
    enabled: bool,
    receiver: watch::Receiver<QueryState>,
}

impl QueryObserver {
    pub(crate) fn new(
        client: QueryClient,
        key: QueryKey,
        enabled: bool,
        receiver: watch::Receiver<QueryState>,
    ) -> Self {
        Self {
            client,
            key,
            enabled,
            receiver,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Snapshot of the current state
    pub fn state(&self) -> QueryState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change
    ///
    /// Returns `false` when the entry was removed from the cache.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until no request is on the wire and a result is available
    ///
    /// Disabled observers settle immediately.
    pub async fn settled(&mut self) -> QueryState {
        loop {
            let state = self.receiver.borrow_and_update().clone();
            let done = !state.is_fetching() && (!state.is_pending() || !self.enabled);
            if done || self.receiver.changed().await.is_err() {
                return state;
            }
        }
    }

    /// Send a new request for this key
    pub async fn refetch(&self) -> QueryResult {
        self.client.refetch(&self.key).await
    }
}

impl std::fmt::Debug for QueryObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", &self.key)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.client.detach(&self.key, self.enabled);
    }
}
