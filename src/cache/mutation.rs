//! One-shot write operations and their side effects
//!
//! A [`Mutation`] wraps a request function. Every invocation runs the same
//! strictly ordered sequence:
//!
//! 1. state becomes `Pending`, then `Success` or `Error`
//! 2. the caller's `on_success` / `on_error` callback
//! 3. on success, invalidation of every dependent key (awaiting the refetch
//!    of observed ones)
//! 4. the success or error notification
//!
//! Mutations never touch cached entries; invalidation is the only way they
//! affect reads.

use super::client::{QueryClient, QueryResult};
use super::state::{MutationState, MutationStatus};
use crate::core::error::AdminError;
use crate::core::notify::{Notifier, notify_error};
use crate::core::query_key::QueryKey;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Function sending the write request for an input
pub type MutationFn<I> = Arc<dyn Fn(I) -> BoxFuture<'static, QueryResult> + Send + Sync>;

pub type SuccessCallback = Arc<dyn Fn(&Value) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&AdminError) + Send + Sync>;

/// Callbacks supplied by the caller of a write hook
#[derive(Clone, Default)]
pub struct MutationOptions {
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&AdminError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for MutationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationOptions")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Side effects shared by every write of an entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryOptions {
    /// Key prefixes invalidated after a successful write
    pub invalidate_queries: Vec<QueryKey>,
    pub success_toast: Option<String>,
    /// Shown when the backend gave no message of its own
    pub error_toast: Option<String>,
}

impl SecondaryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(mut self, key: impl Into<QueryKey>) -> Self {
        self.invalidate_queries.push(key.into());
        self
    }

    pub fn invalidate_all(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.invalidate_queries.extend(keys);
        self
    }

    pub fn success_toast(mut self, message: impl Into<String>) -> Self {
        self.success_toast = Some(message.into());
        self
    }

    pub fn error_toast(mut self, message: impl Into<String>) -> Self {
        self.error_toast = Some(message.into());
        self
    }
}

/// Caller callbacks combined with the secondary side effects
#[derive(Clone)]
pub struct MutationCallbacks {
    options: MutationOptions,
    secondary: SecondaryOptions,
    notifier: Arc<dyn Notifier>,
}

impl MutationCallbacks {
    pub fn invalidated_keys(&self) -> &[QueryKey] {
        &self.secondary.invalidate_queries
    }
}

/// Merge caller options with the entity's secondary options
pub fn compose_options(
    options: MutationOptions,
    secondary: SecondaryOptions,
    notifier: Arc<dyn Notifier>,
) -> MutationCallbacks {
    MutationCallbacks {
        options,
        secondary,
        notifier,
    }
}

struct MutationInner<I> {
    name: String,
    client: QueryClient,
    run: MutationFn<I>,
    callbacks: MutationCallbacks,
    state: watch::Sender<MutationState>,
}

/// A triggerable write bound to a query client
pub struct Mutation<I> {
    inner: Arc<MutationInner<I>>,
}

impl<I> Clone for Mutation<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> std::fmt::Debug for Mutation<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("name", &self.inner.name)
            .field("status", &self.inner.state.borrow().status)
            .finish()
    }
}

impl<I: Send + 'static> Mutation<I> {
    pub fn new(
        name: impl Into<String>,
        client: QueryClient,
        run: MutationFn<I>,
        callbacks: MutationCallbacks,
    ) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            inner: Arc::new(MutationInner {
                name: name.into(),
                client,
                run,
                callbacks,
                state,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> MutationState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.inner.state.subscribe()
    }

    /// Send the request and run the side effects; the outcome is also
    /// recorded in the mutation state
    pub async fn mutate_async(&self, input: I) -> QueryResult {
        self.inner.state.send_modify(|state| {
            state.status = MutationStatus::Pending;
            state.submitted += 1;
        });

        let result = (self.inner.run)(input).await;
        self.settle(result).await
    }

    /// Fire and forget; the error only lands in the mutation state
    pub fn mutate(&self, input: I) -> JoinHandle<()> {
        let mutation = self.clone();
        tokio::spawn(async move {
            let _ = mutation.mutate_async(input).await;
        })
    }

    /// Fail an invocation before any request is sent
    pub async fn reject(&self, error: AdminError) -> QueryResult {
        self.inner.state.send_modify(|state| state.submitted += 1);
        self.settle(Err(error)).await
    }

    /// Back to `Idle`, forgetting data and error
    pub fn reset(&self) {
        self.inner.state.send_replace(MutationState::default());
    }

    async fn settle(&self, result: QueryResult) -> QueryResult {
        let callbacks = &self.inner.callbacks;
        match &result {
            Ok(data) => {
                self.inner.state.send_modify(|state| {
                    state.status = MutationStatus::Success;
                    state.data = Some(data.clone());
                    state.error = None;
                });

                if let Some(on_success) = &callbacks.options.on_success {
                    on_success(data);
                }
                for key in &callbacks.secondary.invalidate_queries {
                    self.inner.client.invalidate_queries(key).await;
                }
                if let Some(message) = &callbacks.secondary.success_toast {
                    callbacks.notifier.success(message);
                }
            }
            Err(error) => {
                tracing::warn!(mutation = %self.inner.name, error = %error, "mutation failed");
                self.inner.state.send_modify(|state| {
                    state.status = MutationStatus::Error;
                    state.data = None;
                    state.error = Some(error.clone());
                });

                if let Some(on_error) = &callbacks.options.on_error {
                    on_error(error);
                }
                notify_error(
                    callbacks.notifier.as_ref(),
                    callbacks.secondary.error_toast.as_deref(),
                    error,
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::client::{QueryFn, QueryOptions};
    use crate::core::notify::{NotificationLevel, RecordingNotifier};
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> MutationFn<Value> {
        Arc::new(|input: Value| async move { Ok(input) }.boxed())
    }

    fn failing() -> MutationFn<Value> {
        Arc::new(|_input: Value| {
            async move { Err(AdminError::backend("api/course/delete", 409, Some(json!({"message": "in use"})))) }
                .boxed()
        })
    }

    #[tokio::test]
    async fn test_success_sequence_is_ordered() {
        let client = QueryClient::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let fetches = Arc::new(AtomicUsize::new(0));
        let fetcher: QueryFn = {
            let fetches = fetches.clone();
            let log = log.clone();
            Arc::new(move || {
                let n = fetches.fetch_add(1, Ordering::SeqCst);
                log.lock().unwrap().push(format!("fetch {n}"));
                async move { Ok(json!(n)) }.boxed()
            })
        };
        let mut observer = client.observe(QueryKey::new("courses"), fetcher, QueryOptions::default());
        observer.settled().await;

        let options = {
            let log = log.clone();
            MutationOptions::new().on_success(move |_| log.lock().unwrap().push("on_success".into()))
        };
        let secondary = SecondaryOptions::new().invalidate("courses").success_toast("Saved");
        let mutation = Mutation::new("createOne", client.clone(), echo(), compose_options(options, secondary, notifier.clone()));

        let data = mutation.mutate_async(json!({"id": 1})).await.unwrap();

        assert_eq!(data, json!({"id": 1}));
        assert_eq!(*log.lock().unwrap(), vec!["fetch 0", "on_success", "fetch 1"]);
        assert_eq!(notifier.messages(NotificationLevel::Success), vec!["Saved"]);
        assert!(mutation.state().is_success());
    }

    #[tokio::test]
    async fn test_error_lands_in_state_and_notifies_error_only() {
        let client = QueryClient::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let errors = Arc::new(AtomicUsize::new(0));

        let options = {
            let errors = errors.clone();
            MutationOptions::new().on_error(move |_| {
                errors.fetch_add(1, Ordering::SeqCst);
            })
        };
        let secondary = SecondaryOptions::new()
            .invalidate("courses")
            .success_toast("Deleted")
            .error_toast("Something went wrong");
        let mutation = Mutation::new("deleteOne", client, failing(), compose_options(options, secondary, notifier.clone()));

        mutation.mutate(json!({"where": {"id": 1}})).await.unwrap();

        let state = mutation.state();
        assert!(state.is_error());
        assert_eq!(state.error.as_ref().map(AdminError::user_message).as_deref(), Some("in use"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(notifier.messages(NotificationLevel::Success).is_empty());
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["in use"]);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mutation = Mutation::new(
            "updateOne",
            QueryClient::new(),
            echo(),
            compose_options(MutationOptions::new(), SecondaryOptions::new(), notifier),
        );

        mutation.mutate_async(json!(1)).await.unwrap();
        mutation.mutate_async(json!(2)).await.unwrap();
        assert_eq!(mutation.state().submitted, 2);

        mutation.reset();
        assert!(mutation.state().is_idle());
        assert_eq!(mutation.state().data, None);
    }
}
