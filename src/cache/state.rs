//! Observable state of cached queries and mutations

use crate::core::error::AdminError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

/// Whether a query has produced data yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// No result yet
    Pending,
    /// Last fetch failed
    Error,
    /// Data is available
    Success,
}

/// Whether a request for the query is on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Fetching,
    Idle,
}

/// Cached result envelope of one query key
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    pub data: Option<Value>,
    pub error: Option<AdminError>,
    pub data_updated_at: Option<Instant>,
    /// Set by invalidation, cleared by the next successful fetch
    pub is_invalidated: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            status: QueryStatus::Pending,
            fetch_status: FetchStatus::Idle,
            data: None,
            error: None,
            data_updated_at: None,
            is_invalidated: false,
        }
    }
}

impl QueryState {
    /// First load in progress: no data and a request on the wire
    pub fn is_loading(&self) -> bool {
        self.is_pending() && self.is_fetching()
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
    }

    /// Decode the cached data into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, AdminError>> {
        self.data.clone().map(|value| {
            serde_json::from_value(value).map_err(|e| AdminError::decode("cached query data", e))
        })
    }

    pub(crate) fn resolve(&mut self, result: &Result<Value, AdminError>) {
        self.fetch_status = FetchStatus::Idle;
        match result {
            Ok(value) => {
                self.status = QueryStatus::Success;
                self.data = Some(value.clone());
                self.error = None;
                self.data_updated_at = Some(Instant::now());
                self.is_invalidated = false;
            }
            Err(error) => {
                self.status = QueryStatus::Error;
                self.error = Some(error.clone());
            }
        }
    }
}

/// Lifecycle of one mutation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Latest invocation of a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationState {
    pub status: MutationStatus,
    pub data: Option<Value>,
    pub error: Option<AdminError>,
    /// How many times the mutation was invoked since the last reset
    pub submitted: u64,
}

impl Default for MutationState {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
            submitted: 0,
        }
    }
}

impl MutationState {
    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loading_requires_pending_and_fetching() {
        let mut state = QueryState::default();
        assert!(!state.is_loading());

        state.fetch_status = FetchStatus::Fetching;
        assert!(state.is_loading());

        state.resolve(&Ok(json!(3)));
        assert!(!state.is_loading());
        assert!(state.is_success());
        assert_eq!(state.decode::<u64>(), Some(Ok(3)));
    }

    #[test]
    fn test_error_keeps_previous_data() {
        let mut state = QueryState::default();
        state.resolve(&Ok(json!([1, 2])));
        state.is_invalidated = true;

        state.resolve(&Err(AdminError::transport("api/course/find-many", "timeout")));

        assert!(state.is_error());
        assert!(state.is_invalidated);
        assert_eq!(state.data, Some(json!([1, 2])));
    }
}
