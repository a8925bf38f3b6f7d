//! Shared setup for hook and page integration tests
//!
//! Builds an [`ApiContext`] over the in-memory service with a recording
//! notifier, so tests can assert on requests sent and toasts shown.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod hooks_harness;
//! use hooks_harness::*;
//! ```

#![allow(dead_code)]

use academy::prelude::*;
use std::sync::Mutex;

/// Context, backend and notification sink of one test
pub struct Harness {
    pub ctx: ApiContext,
    pub service: InMemoryService,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    /// Context whose reads never retry, so failures settle immediately
    pub fn new() -> Self {
        Self::with_client(QueryClient::with_config(QueryClientConfig {
            retry: RetryPolicy::never(),
            ..QueryClientConfig::default()
        }))
    }

    pub fn with_client(client: QueryClient) -> Self {
        let service = InMemoryService::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = ApiContext::new(Arc::new(service.clone()), client, notifier.clone());
        Self {
            ctx,
            service,
            notifier,
        }
    }

    /// Insert `count` courses titled `Course 1..=count`, returning them
    pub fn seed_courses(&self, count: usize) -> Vec<Value> {
        (1..=count)
            .map(|n| {
                self.service.insert(
                    "Course",
                    json!({
                        "titleUz": format!("Course {n}"),
                        "price": 100_000 * n,
                        "isPublished": n % 2 == 0,
                        "createdAt": format!("2024-01-{n:02}T10:00:00Z"),
                    }),
                )
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notifier.messages(NotificationLevel::Success)
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifier.messages(NotificationLevel::Error)
    }
}

/// Collects labelled events from callbacks, to assert on their order
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Id of a record returned by the in-memory service
pub fn id_of(record: &Value) -> String {
    record["id"].as_str().unwrap().to_string()
}
