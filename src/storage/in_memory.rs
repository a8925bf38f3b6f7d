//! In-memory implementation of CrudService for testing and development
//!
//! Records are kept per model in insertion order and answer the same verbs as
//! the backend with the same response shapes. For tests, calls can be delayed,
//! failed on demand, counted and recorded.

use crate::core::entity::EntityModel;
use crate::core::error::AdminError;
use crate::core::operation::CrudOp;
use crate::core::service::CrudService;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Handler of an ad-hoc `POST` endpoint
pub type ActionFn = Arc<dyn Fn(Value) -> Result<Value, AdminError> + Send + Sync>;

/// One request received by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Model name, `None` for ad-hoc endpoints
    pub model: Option<String>,
    pub op: Option<CrudOp>,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, IndexMap<String, Map<String, Value>>>,
    calls: Vec<RecordedCall>,
    failures: VecDeque<AdminError>,
    actions: HashMap<String, ActionFn>,
    latency: Option<Duration>,
}

/// In-memory CRUD service
///
/// Cheap to clone; clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryService {
    state: Arc<RwLock<State>>,
}

impl std::fmt::Debug for InMemoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryService").finish_non_exhaustive()
    }
}

impl InMemoryService {
    /// Create a new, empty in-memory service
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.latency = Some(latency);
        }
        self
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, AdminError> {
        self.state
            .read()
            .map_err(|e| AdminError::Internal(format!("Failed to acquire read lock: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, AdminError> {
        self.state
            .write()
            .map_err(|e| AdminError::Internal(format!("Failed to acquire write lock: {e}")))
    }

    /// Make the next call fail with `error`, before touching any record
    pub fn fail_next(&self, error: AdminError) {
        if let Ok(mut state) = self.write() {
            state.failures.push_back(error);
        }
    }

    /// Answer `POST path` with `handler`
    pub fn register_action(
        &self,
        path: &str,
        handler: impl Fn(Value) -> Result<Value, AdminError> + Send + Sync + 'static,
    ) {
        if let Ok(mut state) = self.write() {
            state.actions.insert(normalize(path), Arc::new(handler));
        }
    }

    /// Store a record as is, minting an id when it has none
    pub fn insert(&self, model: &str, record: Value) -> Value {
        let Value::Object(mut record) = record else {
            return Value::Null;
        };
        let id = ensure_id(&mut record);
        if let Ok(mut state) = self.write() {
            state
                .tables
                .entry(model.to_string())
                .or_default()
                .insert(id, record.clone());
        }
        Value::Object(record)
    }

    /// Records of a model, in insertion order
    pub fn records(&self, model: &str) -> Vec<Value> {
        self.read()
            .map(|state| {
                state
                    .tables
                    .get(model)
                    .map(|table| table.values().cloned().map(Value::Object).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.read().map(|state| state.calls.clone()).unwrap_or_default()
    }

    /// Number of calls of one verb on one model
    pub fn call_count(&self, model: &str, op: CrudOp) -> usize {
        self.read()
            .map(|state| {
                state
                    .calls
                    .iter()
                    .filter(|call| call.model.as_deref() == Some(model) && call.op == Some(op))
                    .count()
            })
            .unwrap_or_default()
    }

    /// Number of calls to an ad-hoc endpoint
    pub fn path_count(&self, path: &str) -> usize {
        let path = normalize(path);
        self.read()
            .map(|state| state.calls.iter().filter(|call| call.path == path).count())
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.read().map(|state| state.calls.len()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.write() {
            state.calls.clear();
        }
    }

    /// Record the call and pop a pending failure; returns the latency to apply
    fn begin(&self, call: RecordedCall) -> Result<Option<Duration>, AdminError> {
        let mut state = self.write()?;
        tracing::debug!(path = %call.path, "in-memory call");
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.latency),
        }
    }

    fn execute(&self, model: &EntityModel, op: CrudOp, body: Option<Value>, path: &str) -> Result<Value, AdminError> {
        let mut state = self.write()?;
        let table = state.tables.entry(model.name.clone()).or_default();
        let body = body.unwrap_or(Value::Null);

        match op {
            CrudOp::Count => {
                let filter = body.get("where");
                Ok(json!(table.values().filter(|r| matches(r, filter)).count()))
            }
            CrudOp::Exist => {
                let filter = body.get("where");
                Ok(json!(table.values().any(|r| matches(r, filter))))
            }
            CrudOp::FindMany => {
                let filter = body.get("where");
                let mut rows: Vec<&Map<String, Value>> = table.values().filter(|r| matches(r, filter)).collect();
                if let Some(order_by) = body.get("orderBy") {
                    sort_rows(&mut rows, order_by);
                }
                let total = rows.len();
                let skip = body.get("skip").and_then(Value::as_u64).map_or(0, to_usize);
                let take = body.get("take").and_then(Value::as_u64).map_or(usize::MAX, to_usize);
                let data: Vec<Value> = rows
                    .into_iter()
                    .skip(skip)
                    .take(take)
                    .map(|r| Value::Object(r.clone()))
                    .collect();
                Ok(json!({ "data": data, "totalCount": total }))
            }
            CrudOp::FindOne => {
                let filter = body.get("where");
                Ok(table
                    .values()
                    .find(|r| matches(r, filter))
                    .map(|r| Value::Object(r.clone()))
                    .unwrap_or(Value::Null))
            }
            CrudOp::CreateOne => {
                let record = create(table, body.get("data").cloned().unwrap_or(Value::Null), path)?;
                Ok(Value::Object(record))
            }
            CrudOp::CreateMany => {
                let items = list_of(body.get("data"), path)?;
                let count = items.len();
                for item in items {
                    create(table, item, path)?;
                }
                Ok(json!({ "count": count }))
            }
            CrudOp::CreateList => {
                let items = list_of(Some(&body), path)?;
                let created = items
                    .into_iter()
                    .map(|item| create(table, item, path).map(Value::Object))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(created))
            }
            CrudOp::UpdateOne => {
                let key = first_match(table, body.get("where")).ok_or_else(|| not_found(path))?;
                Ok(Value::Object(update(table, &key, body.get("data"))))
            }
            CrudOp::UpdateMany => {
                let keys = all_matches(table, body.get("where"));
                for key in &keys {
                    update(table, key, body.get("data"));
                }
                Ok(json!({ "count": keys.len() }))
            }
            CrudOp::UpdateList => {
                let items = list_of(Some(&body), path)?;
                let mut updated = Vec::with_capacity(items.len());
                for item in items {
                    let id = item.get("id").map(id_key).ok_or_else(|| not_found(path))?;
                    if !table.contains_key(&id) {
                        return Err(not_found(path));
                    }
                    updated.push(Value::Object(update(table, &id, Some(&item))));
                }
                Ok(Value::Array(updated))
            }
            CrudOp::DeleteOne => {
                let key = first_match(table, body.get("where")).ok_or_else(|| not_found(path))?;
                let removed = table.shift_remove(&key).unwrap_or_default();
                Ok(Value::Object(removed))
            }
            CrudOp::DeleteMany => {
                let keys = all_matches(table, body.get("where"));
                for key in &keys {
                    table.shift_remove(key);
                }
                Ok(json!({ "count": keys.len() }))
            }
            CrudOp::DeleteAll => {
                let count = table.len();
                table.clear();
                Ok(json!({ "count": count }))
            }
        }
    }
}

#[async_trait]
impl CrudService for InMemoryService {
    async fn call(&self, model: &EntityModel, op: CrudOp, body: Option<Value>) -> Result<Value, AdminError> {
        let path = normalize(&model.operation_path(op.path()));
        let latency = self.begin(RecordedCall {
            model: Some(model.name.clone()),
            op: Some(op),
            path: path.clone(),
            body: body.clone(),
        })?;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.execute(model, op, body, &path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AdminError> {
        let path = normalize(path);
        let latency = self.begin(RecordedCall {
            model: None,
            op: None,
            path: path.clone(),
            body: Some(body.clone()),
        })?;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let action = self.read()?.actions.get(&path).cloned();
        match action {
            Some(action) => action(body),
            None => Err(not_found(&path)),
        }
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

fn not_found(path: &str) -> AdminError {
    AdminError::backend(path, 404, Some(json!({ "message": "Record not found" })))
}

fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ensure_id(record: &mut Map<String, Value>) -> String {
    match record.get("id").filter(|id| !id.is_null()) {
        Some(id) => id_key(id),
        None => {
            let id = Uuid::new_v4().to_string();
            record.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

fn list_of(value: Option<&Value>, path: &str) -> Result<Vec<Value>, AdminError> {
    match value {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(AdminError::backend(
            path,
            400,
            Some(json!({ "message": "expected a list of records" })),
        )),
    }
}

fn create(
    table: &mut IndexMap<String, Map<String, Value>>,
    data: Value,
    path: &str,
) -> Result<Map<String, Value>, AdminError> {
    let Value::Object(mut record) = data else {
        return Err(AdminError::backend(
            path,
            400,
            Some(json!({ "message": "data must be an object" })),
        ));
    };

    let id = ensure_id(&mut record);
    if table.contains_key(&id) {
        return Err(AdminError::backend(
            path,
            409,
            Some(json!({ "message": format!("Record {id} already exists") })),
        ));
    }

    let now = Value::String(Utc::now().to_rfc3339());
    record.entry("createdAt").or_insert_with(|| now.clone());
    record.entry("updatedAt").or_insert(now);
    table.insert(id, record.clone());
    Ok(record)
}

fn update(table: &mut IndexMap<String, Map<String, Value>>, key: &str, data: Option<&Value>) -> Map<String, Value> {
    let Some(record) = table.get_mut(key) else {
        return Map::new();
    };
    if let Some(Value::Object(changes)) = data {
        for (field, value) in changes {
            if field != "id" {
                record.insert(field.clone(), value.clone());
            }
        }
    }
    record.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    record.clone()
}

fn first_match(table: &IndexMap<String, Map<String, Value>>, filter: Option<&Value>) -> Option<String> {
    table
        .iter()
        .find(|(_, record)| matches(record, filter))
        .map(|(key, _)| key.clone())
}

fn all_matches(table: &IndexMap<String, Map<String, Value>>, filter: Option<&Value>) -> Vec<String> {
    table
        .iter()
        .filter(|(_, record)| matches(record, filter))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Subset of the backend's filter language: equality, `in`, `not`,
/// `contains`, `AND`, `OR`
fn matches(record: &Map<String, Value>, filter: Option<&Value>) -> bool {
    let Some(Value::Object(filter)) = filter else {
        return true;
    };

    filter.iter().all(|(field, condition)| match field.as_str() {
        "AND" => as_list(condition).iter().all(|f| matches(record, Some(f))),
        "OR" => as_list(condition).iter().any(|f| matches(record, Some(f))),
        _ => field_matches(record.get(field).unwrap_or(&Value::Null), condition),
    })
}

fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn field_matches(value: &Value, condition: &Value) -> bool {
    let Value::Object(operators) = condition else {
        return same(value, condition);
    };
    let is_operator = |key: &str| matches!(key, "in" | "not" | "contains" | "equals");
    if !operators.keys().all(|key| is_operator(key.as_str())) {
        // Nested object compared structurally
        return value == condition;
    }

    operators.iter().all(|(operator, operand)| match operator.as_str() {
        "equals" => same(value, operand),
        "in" => as_list(operand).iter().any(|candidate| same(value, candidate)),
        "not" => !same(value, operand),
        "contains" => match (value.as_str(), operand.as_str()) {
            (Some(text), Some(needle)) => text.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        _ => false,
    })
}

/// Equality where `3` and `"3"` name the same id
fn same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => id_key(left) == id_key(right),
        _ => left == right,
    }
}

fn sort_rows(rows: &mut [&Map<String, Value>], order_by: &Value) {
    let orders: Vec<(String, bool)> = as_list(order_by)
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|order| {
            order
                .iter()
                .map(|(field, direction)| (field.clone(), direction.as_str() == Some("desc")))
                .collect::<Vec<_>>()
        })
        .collect();

    rows.sort_by(|a, b| {
        orders
            .iter()
            .map(|(field, desc)| {
                let ordering = compare(a.get(field), b.get(field));
                if *desc { ordering.reverse() } else { ordering }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
