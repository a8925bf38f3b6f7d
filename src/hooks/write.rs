//! Write hooks: one mutation per CRUD write verb
//!
//! | hook               | input             | request body          |
//! |--------------------|-------------------|-----------------------|
//! | `use_create_one`   | `D`               | `{data}`              |
//! | `use_create_many`  | `Vec<D>`          | `{data: [...]}`       |
//! | `use_create_list`  | `Vec<D>`          | `[...]`               |
//! | `use_update_one`   | `UpdateArgs<D>`   | `{data, where}`       |
//! | `use_update_many`  | `UpdateArgs<D>`   | `{data, where}`       |
//! | `use_update_list`  | `Vec<D>`          | `[...]`               |
//! | `use_delete_one`   | `DeleteTarget`    | `{where}`             |
//! | `use_delete_many`  | `Where`           | `{where}`             |
//! | `use_delete_all`   | `()`              | none                  |
//!
//! Without explicit [`SecondaryOptions`] a write invalidates every view of
//! its model.

use super::EntityHooks;
use crate::cache::{
    Mutation, MutationFn, MutationOptions, MutationState, MutationStatus, QueryResult,
    SecondaryOptions, compose_options,
};
use crate::core::entity::Entity;
use crate::core::error::AdminError;
use crate::core::operation::CrudOp;
use crate::core::query::{CreateArgs, DeleteArgs, DeleteTarget, UpdateArgs, Where};
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Marker types naming the write verb of a [`MutationHandle`]
pub mod op {
    #[derive(Debug)]
    pub struct CreateOne;
    #[derive(Debug)]
    pub struct CreateMany;
    #[derive(Debug)]
    pub struct CreateList;
    #[derive(Debug)]
    pub struct UpdateOne;
    #[derive(Debug)]
    pub struct UpdateMany;
    #[derive(Debug)]
    pub struct UpdateList;
    #[derive(Debug)]
    pub struct DeleteOne;
    #[derive(Debug)]
    pub struct DeleteMany;
    #[derive(Debug)]
    pub struct DeleteAll;
}

/// A write hook of model `E` for verb `O`, taking `I` as input
///
/// `define_entities!` adds entity-named accessors per verb
/// (`create_course`, `is_loading_create_course`, `created_course`, ...).
pub struct MutationHandle<I, E, O> {
    mutation: Mutation<I>,
    _marker: PhantomData<fn() -> (E, O)>,
}

impl<I, E, O> Clone for MutationHandle<I, E, O> {
    fn clone(&self) -> Self {
        Self {
            mutation: self.mutation.clone(),
            _marker: PhantomData,
        }
    }
}

impl<I, E, O> std::fmt::Debug for MutationHandle<I, E, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationHandle")
            .field("mutation", &self.mutation)
            .finish()
    }
}

impl<I: Send + 'static, E, O> MutationHandle<I, E, O> {
    pub(crate) fn new(mutation: Mutation<I>) -> Self {
        Self {
            mutation,
            _marker: PhantomData,
        }
    }

    pub fn mutation(&self) -> &Mutation<I> {
        &self.mutation
    }

    pub fn state(&self) -> MutationState {
        self.mutation.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.mutation.subscribe()
    }

    pub fn status(&self) -> MutationStatus {
        self.state().status
    }

    pub fn is_idle(&self) -> bool {
        self.state().is_idle()
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    /// Same as [`is_pending`](Self::is_pending)
    pub fn is_loading(&self) -> bool {
        self.is_pending()
    }

    pub fn is_error(&self) -> bool {
        self.state().is_error()
    }

    pub fn is_success(&self) -> bool {
        self.state().is_success()
    }

    /// Response of the last successful invocation
    pub fn data(&self) -> Option<Value> {
        self.state().data
    }

    pub fn error(&self) -> Option<AdminError> {
        self.state().error
    }

    /// Decode the last response
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, AdminError>> {
        self.data().map(|value| {
            serde_json::from_value(value).map_err(|e| AdminError::decode(self.mutation.name(), e))
        })
    }

    /// Fire and forget; failures only land in the state
    pub fn mutate(&self, input: I) -> JoinHandle<()> {
        self.mutation.mutate(input)
    }

    pub async fn mutate_async(&self, input: I) -> QueryResult {
        self.mutation.mutate_async(input).await
    }

    pub fn reset(&self) {
        self.mutation.reset();
    }
}

impl<E> MutationHandle<DeleteTarget, E, op::DeleteOne> {
    /// Delete the record behind a table row
    ///
    /// A row without a usable `id` fails the mutation with
    /// [`ValidationError::MissingId`](crate::core::ValidationError::MissingId)
    /// and sends nothing.
    pub async fn delete_from_table(&self, row: &Value) -> QueryResult {
        match DeleteTarget::from_row(row) {
            Ok(target) => self.mutation.mutate_async(target).await,
            Err(error) => self.mutation.reject(error.into()).await,
        }
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, AdminError> {
    serde_json::to_value(value).map_err(|e| AdminError::decode("request body", e))
}

impl<E: Entity> EntityHooks<E> {
    /// `createOne {data}`
    pub fn use_create_one<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<D, E, op::CreateOne>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::CreateOne, options, secondary, |data: D| {
            to_body(&CreateArgs { data }).map(Some)
        })
    }

    /// `createMany {data: [...]}`
    pub fn use_create_many<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<Vec<D>, E, op::CreateMany>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::CreateMany, options, secondary, |data: Vec<D>| {
            to_body(&CreateArgs { data }).map(Some)
        })
    }

    /// `createList [...]`, the list is the body
    pub fn use_create_list<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<Vec<D>, E, op::CreateList>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::CreateList, options, secondary, |items: Vec<D>| {
            to_body(&items).map(Some)
        })
    }

    /// `updateOne {data, where}`
    pub fn use_update_one<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<UpdateArgs<D>, E, op::UpdateOne>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::UpdateOne, options, secondary, |args: UpdateArgs<D>| {
            to_body(&args).map(Some)
        })
    }

    /// `updateMany {data, where}`
    pub fn use_update_many<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<UpdateArgs<D>, E, op::UpdateMany>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::UpdateMany, options, secondary, |args: UpdateArgs<D>| {
            to_body(&args).map(Some)
        })
    }

    /// `updateList [...]`, the list is the body
    pub fn use_update_list<D>(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<Vec<D>, E, op::UpdateList>
    where
        D: Serialize + Send + 'static,
    {
        self.write_hook(CrudOp::UpdateList, options, secondary, |items: Vec<D>| {
            to_body(&items).map(Some)
        })
    }

    /// `deleteOne {where}` from an id or an explicit filter
    pub fn use_delete_one(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<DeleteTarget, E, op::DeleteOne> {
        self.write_hook(CrudOp::DeleteOne, options, secondary, |target: DeleteTarget| {
            to_body(&target.into_args()).map(Some)
        })
    }

    /// `deleteMany {where}`
    pub fn use_delete_many(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<Where, E, op::DeleteMany> {
        self.write_hook(CrudOp::DeleteMany, options, secondary, |filter: Where| {
            to_body(&DeleteArgs { filter }).map(Some)
        })
    }

    /// `deleteAll`, no body
    pub fn use_delete_all(
        &self,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
    ) -> MutationHandle<(), E, op::DeleteAll> {
        self.write_hook(CrudOp::DeleteAll, options, secondary, |()| Ok(None))
    }

    fn write_hook<I, O>(
        &self,
        op: CrudOp,
        options: MutationOptions,
        secondary: Option<SecondaryOptions>,
        body: impl Fn(I) -> Result<Option<Value>, AdminError> + Send + Sync + 'static,
    ) -> MutationHandle<I, E, O>
    where
        I: Send + 'static,
    {
        let service = self.ctx.service.clone();
        let model = self.model.clone();
        let run: MutationFn<I> = Arc::new(move |input: I| {
            let service = service.clone();
            let model = model.clone();
            let body = body(input);
            async move {
                let body = body?;
                service.call(&model, op, body).await
            }
            .boxed()
        });

        let secondary = secondary.unwrap_or_else(|| self.default_secondary(op));
        let callbacks = compose_options(options, secondary, self.ctx.notifier.clone());
        let name = format!("{}.{}", self.model.name, op.name());

        MutationHandle::new(Mutation::new(name, self.ctx.client.clone(), run, callbacks))
    }
}
