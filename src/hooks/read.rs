//! Read hooks: cached, deduplicated queries
//!
//! Every read has the shape `[<root>, ...params]` as its key, so two hooks
//! asked for the same view with structurally equal arguments share one
//! request and one cached result.

use super::EntityHooks;
use crate::cache::{FetchStatus, QueryFn, QueryObserver, QueryOptions, QueryResult, QueryState, QueryStatus};
use crate::core::entity::Entity;
use crate::core::error::AdminError;
use crate::core::operation::CrudOp;
use crate::core::query::{FindArgs, Page};
use crate::core::query_key::QueryKey;
use crate::pages::location::{LocationParams, TableFetchProps};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Options accepted by every read hook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// `None` lets the hook decide (see each hook)
    pub enabled: Option<bool>,
    pub stale_time: Option<Duration>,
    pub gc_time: Option<Duration>,
    pub retry: Option<u32>,
}

impl ReadOptions {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub(crate) fn query_options(&self, enabled: bool) -> QueryOptions {
        QueryOptions {
            enabled,
            stale_time: self.stale_time,
            gc_time: self.gc_time,
            retry: self.retry,
        }
    }
}

/// Snapshot of a read, decoded into `T`
///
/// Besides the generic accessors, `define_entities!` adds entity-named ones
/// (`courses_data`, `is_loading_courses`, ...) for each model.
pub struct ReadResult<T, E> {
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    pub data: Option<T>,
    pub error: Option<AdminError>,
    _entity: PhantomData<fn() -> E>,
}

impl<T: DeserializeOwned, E> ReadResult<T, E> {
    /// Decode a cache state; undecodable data turns the result into an error
    pub fn from_state(state: &QueryState) -> Self {
        let mut result = Self {
            status: state.status,
            fetch_status: state.fetch_status,
            data: None,
            error: state.error.clone(),
            _entity: PhantomData,
        };

        match state.decode::<T>() {
            Some(Ok(data)) => result.data = Some(data),
            Some(Err(error)) => {
                result.status = QueryStatus::Error;
                result.error = Some(error);
            }
            None => {}
        }
        result
    }
}

impl<T, E> ReadResult<T, E> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.fetch_status == FetchStatus::Fetching
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
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

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&AdminError> {
        self.error.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<T: Clone, E> Clone for ReadResult<T, E> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            fetch_status: self.fetch_status,
            data: self.data.clone(),
            error: self.error.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for ReadResult<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadResult")
            .field("status", &self.status)
            .field("fetch_status", &self.fetch_status)
            .field("data", &self.data)
            .field("error", &self.error)
            .finish()
    }
}

/// Live subscription to one read
pub struct ReadHandle<T, E> {
    observer: QueryObserver,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T: DeserializeOwned, E> ReadHandle<T, E> {
    pub(crate) fn new(observer: QueryObserver) -> Self {
        Self {
            observer,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        self.observer.key()
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_enabled()
    }

    pub fn observer(&self) -> &QueryObserver {
        &self.observer
    }

    /// Current snapshot
    pub fn result(&self) -> ReadResult<T, E> {
        ReadResult::from_state(&self.observer.state())
    }

    /// Wait for the next state change; `false` once the entry is gone
    pub async fn changed(&mut self) -> bool {
        self.observer.changed().await
    }

    /// Wait until the read has a result (or is disabled) and nothing is on the wire
    pub async fn settled(&mut self) -> ReadResult<T, E> {
        ReadResult::from_state(&self.observer.settled().await)
    }

    /// Send a new request and wait for it
    ///
    /// The outcome lands in the entry state, so the returned snapshot carries
    /// the request's data or error.
    pub async fn refetch(&mut self) -> ReadResult<T, E> {
        if let Err(error) = self.observer.refetch().await {
            tracing::debug!(key = ?self.key(), error = %error, "refetch failed");
        }
        self.settled().await
    }
}

impl<T, E> std::fmt::Debug for ReadHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadHandle")
            .field("observer", &self.observer)
            .finish()
    }
}

impl<E: Entity> EntityHooks<E> {
    /// Aggregation through the model's ad-hoc endpoint
    ///
    /// Key `[aggregate-<plural>, props]`; runs unless disabled explicitly.
    pub fn use_aggregate(&self, props: Value, options: ReadOptions) -> ReadHandle<Value, E> {
        let key = self.model.keys.aggregate().with(&props);
        let service = self.ctx.service.clone();
        let path = self.model.aggregate_path.clone();

        let fetcher: QueryFn = Arc::new(move || {
            let service = service.clone();
            let path = path.clone();
            let props = props.clone();
            async move { service.post(&path, props).await }.boxed()
        });
        self.observe(key, fetcher, &options, options.enabled.unwrap_or(true))
    }

    /// Number of matching records; key `[count-<plural>, props]`
    pub fn use_count(&self, props: FindArgs, options: ReadOptions) -> ReadHandle<u64, E> {
        let body = Value::Object(props.to_map());
        let key = self.model.keys.count().with(&body);
        self.observe(key, self.crud_fetcher(CrudOp::Count, body), &options, options.enabled.unwrap_or(true))
    }

    /// Whether any record matches; key `[exist-<singular>, props]`
    pub fn use_exist(&self, props: FindArgs, options: ReadOptions) -> ReadHandle<bool, E> {
        let body = Value::Object(props.to_map());
        let key = self.model.keys.exist().with(&body);
        self.observe(key, self.crud_fetcher(CrudOp::Exist, body), &options, options.enabled.unwrap_or(true))
    }

    /// One page of records; key `[<plural>, props]`
    ///
    /// Runs unless `enabled` is explicitly `false`.
    pub fn use_many(&self, props: FindArgs, options: ReadOptions) -> ReadHandle<Page<E::Record>, E> {
        let body = Value::Object(props.to_map());
        let key = self.model.keys.list().with(&body);
        let enabled = options.enabled != Some(false);
        self.observe(key, self.crud_fetcher(CrudOp::FindMany, body), &options, enabled)
    }

    /// The table page selected by the location's `pageSize` / `pageNumber`
    ///
    /// Key `[<plural>, tableFetchProps, props]`. The caller's arguments win
    /// over the pagination ones. Nothing is requested until the location has
    /// a page size; an explicit `enabled` is AND-ed with that condition.
    pub fn use_many_with_pagination(
        &self,
        props: FindArgs,
        options: ReadOptions,
        location: &LocationParams,
    ) -> ReadHandle<Page<E::Record>, E> {
        let (key, enabled) = self.pagination_view(&props, &options, location);
        let table = TableFetchProps::from_location(location);
        let args = props.merged_over(table.to_map()).unwrap_or_else(|error| {
            tracing::warn!(model = %self.model.name, error = %error, "ignoring pagination arguments");
            props.clone()
        });

        let body = Value::Object(args.to_map());
        self.observe(key, self.crud_fetcher(CrudOp::FindMany, body), &options, enabled)
    }

    /// Key and enabled flag [`use_many_with_pagination`](Self::use_many_with_pagination)
    /// would subscribe with, without subscribing
    pub fn pagination_view(
        &self,
        props: &FindArgs,
        options: &ReadOptions,
        location: &LocationParams,
    ) -> (QueryKey, bool) {
        let table = TableFetchProps::from_location(location);
        let enabled = table.take.is_some() && options.enabled.unwrap_or(true);
        let key = self
            .model
            .keys
            .list()
            .with(Value::Object(table.to_map()))
            .with(Value::Object(props.to_map()));
        (key, enabled)
    }

    /// First matching record or `None`; key `[<singular>, props]`
    pub fn use_one(&self, props: FindArgs, options: ReadOptions) -> ReadHandle<Option<E::Record>, E> {
        let body = Value::Object(props.to_map());
        let key = self.model.keys.single().with(&body);
        self.observe(key, self.crud_fetcher(CrudOp::FindOne, body), &options, options.enabled.unwrap_or(true))
    }

    /// Imperative single-record read sharing the `use_one` cache entry
    pub async fn fetch_one_raw(&self, props: FindArgs) -> QueryResult {
        let body = Value::Object(props.to_map());
        let key = self.model.keys.single().with(&body);
        self.ctx
            .client
            .fetch_query(key, self.crud_fetcher(CrudOp::FindOne, body), QueryOptions::default())
            .await
    }

    /// [`fetch_one_raw`](Self::fetch_one_raw) decoded into the record type
    pub async fn fetch_one(&self, props: FindArgs) -> Result<Option<E::Record>, AdminError> {
        let value = self.fetch_one_raw(props).await?;
        serde_json::from_value(value).map_err(|e| AdminError::decode(self.model.operation_path(CrudOp::FindOne.path()), e))
    }

    fn crud_fetcher(&self, op: CrudOp, body: Value) -> QueryFn {
        let service = self.ctx.service.clone();
        let model = self.model.clone();
        Arc::new(move || {
            let service = service.clone();
            let model = model.clone();
            let body = body.clone();
            async move { service.call(&model, op, Some(body)).await }.boxed()
        })
    }

    fn observe<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        fetcher: QueryFn,
        options: &ReadOptions,
        enabled: bool,
    ) -> ReadHandle<T, E> {
        tracing::debug!(model = %self.model.name, key = %key, enabled, "read hook");
        let observer = self
            .ctx
            .client
            .observe(key, fetcher, options.query_options(enabled));
        ReadHandle::new(observer)
    }
}
