//! Transport seam between the hooks and the backend

use crate::core::entity::EntityModel;
use crate::core::error::AdminError;
use crate::core::operation::CrudOp;
use async_trait::async_trait;
use serde_json::Value;

/// Service trait executing CRUD operations against the backend
///
/// Implementations decide how a request reaches the backend (HTTP, in-memory
/// fixture, ...). The hooks only see JSON in and JSON out; decoding into typed
/// records happens on the read side.
#[async_trait]
pub trait CrudService: Send + Sync {
    /// Execute one CRUD verb for `model`
    ///
    /// `body` is `None` only for bodyless verbs (`deleteAll`).
    async fn call(&self, model: &EntityModel, op: CrudOp, body: Option<Value>) -> Result<Value, AdminError>;

    /// POST to an ad-hoc endpoint (aggregate, bot actions, ...)
    ///
    /// `path` is absolute from the backend root, e.g. `/api/course/aggregate`.
    async fn post(&self, path: &str, body: Value) -> Result<Value, AdminError>;
}
