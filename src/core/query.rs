//! Request and response shapes of the CRUD contract

use crate::core::error::{AdminError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Row type for models without a dedicated record struct
pub type JsonRecord = Map<String, Value>;

/// Identifier of one backend record
///
/// The backend mixes numeric and string (UUID) ids, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Read an id out of a JSON value (number or string)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) if !s.is_empty() => Some(EntityId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            EntityId::Int(i) => Value::from(*i),
            EntityId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(i) => write!(f, "{i}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Text(id)
    }
}

impl From<uuid::Uuid> for EntityId {
    fn from(id: uuid::Uuid) -> Self {
        EntityId::Text(id.to_string())
    }
}

/// A `where` filter, forwarded verbatim to the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Where(pub Map<String, Value>);

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{ "id": <id> }`
    pub fn id(id: impl Into<EntityId>) -> Self {
        Self::new().eq("id", id.into().to_value())
    }

    /// Add an equality condition on `field`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Add a `{ field: { in: [...] } }` condition
    pub fn any_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        let mut condition = Map::new();
        condition.insert("in".to_string(), Value::Array(values));
        self.0.insert(field.into(), Value::Object(condition));
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Arguments of the read verbs (`count`, `exist`, `findMany`, `findOne`)
///
/// Known fields are typed; anything else goes through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindArgs {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Where>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FindArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn include(mut self, include: Value) -> Self {
        self.include = Some(include);
        self
    }

    pub fn select(mut self, select: Value) -> Self {
        self.select = Some(select);
        self
    }

    pub fn order_by(mut self, order_by: Value) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Add an arbitrary argument forwarded as is
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// The arguments as a JSON object
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Overlay these arguments on top of `base`; fields set here win
    pub fn merged_over(&self, base: Map<String, Value>) -> Result<FindArgs, AdminError> {
        let mut merged = base;
        merged.extend(self.to_map());
        serde_json::from_value(Value::Object(merged))
            .map_err(|e| AdminError::decode("find arguments", e))
    }
}

/// Body of `createOne` / `createMany`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateArgs<D> {
    pub data: D,
}

/// Body of `updateOne` / `updateMany`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateArgs<D> {
    pub data: D,

    #[serde(rename = "where")]
    pub filter: Where,
}

impl<D> UpdateArgs<D> {
    pub fn new(data: D, filter: Where) -> Self {
        Self { data, filter }
    }

    /// Update the record with the given id
    pub fn by_id(data: D, id: impl Into<EntityId>) -> Self {
        Self::new(data, Where::id(id))
    }
}

/// Body of `deleteOne` / `deleteMany`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteArgs {
    #[serde(rename = "where")]
    pub filter: Where,
}

/// What `deleteOne` accepts: a bare id or an explicit filter
///
/// Both forms produce the same request body for the same id.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Id(EntityId),
    Where(Where),
}

impl DeleteTarget {
    /// Build the target from a table row carrying an `id` field
    pub fn from_row(row: &Value) -> Result<Self, ValidationError> {
        row.get("id")
            .and_then(EntityId::from_value)
            .map(DeleteTarget::Id)
            .ok_or(ValidationError::MissingId)
    }

    pub fn into_args(self) -> DeleteArgs {
        let filter = match self {
            DeleteTarget::Id(id) => Where::id(id),
            DeleteTarget::Where(filter) => filter,
        };
        DeleteArgs { filter }
    }
}

impl From<EntityId> for DeleteTarget {
    fn from(id: EntityId) -> Self {
        DeleteTarget::Id(id)
    }
}

impl From<i64> for DeleteTarget {
    fn from(id: i64) -> Self {
        DeleteTarget::Id(id.into())
    }
}

impl From<&str> for DeleteTarget {
    fn from(id: &str) -> Self {
        DeleteTarget::Id(id.into())
    }
}

impl From<String> for DeleteTarget {
    fn from(id: String) -> Self {
        DeleteTarget::Id(id.into())
    }
}

impl From<Where> for DeleteTarget {
    fn from(filter: Where) -> Self {
        DeleteTarget::Where(filter)
    }
}

/// Response of `findMany`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub total_count: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pagination metadata for a page number (starting at 1) and page size
    pub fn meta(&self, page: u64, limit: u64) -> PaginationMeta {
        PaginationMeta::new(page, limit, self.total_count)
    }
}

/// Response of the batch verbs (`createMany`, `updateMany`, `deleteMany`, `deleteAll`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub count: u64,
}

/// Pagination metadata shown under a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: u64,

    /// Number of items per page
    pub limit: u64,

    /// Total number of items (after filters)
    pub total: u64,

    pub total_pages: u64,

    pub has_next: bool,

    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1) * limit;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start + limit < total,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_args_serialization() {
        let args = FindArgs::new()
            .filter(Where::new().eq("isActive", true))
            .order_by(json!({"order": "asc"}))
            .take(10)
            .with("distinct", json!(["categoryId"]));

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "where": {"isActive": true},
                "orderBy": {"order": "asc"},
                "take": 10,
                "distinct": ["categoryId"]
            })
        );
    }

    #[test]
    fn test_merged_over_prefers_own_fields() {
        let mut base = Map::new();
        base.insert("take".to_string(), json!(10));
        base.insert("skip".to_string(), json!(20));
        base.insert("orderBy".to_string(), json!({"createdAt": "desc"}));

        let merged = FindArgs::new()
            .order_by(json!({"title": "asc"}))
            .merged_over(base)
            .unwrap();

        assert_eq!(merged.take, Some(10));
        assert_eq!(merged.skip, Some(20));
        assert_eq!(merged.order_by, Some(json!({"title": "asc"})));
    }

    #[test]
    fn test_delete_target_forms_are_equivalent() {
        let from_id = DeleteTarget::from(7).into_args();
        let from_where = DeleteTarget::from(Where::id(7)).into_args();
        assert_eq!(from_id, from_where);
        assert_eq!(serde_json::to_value(&from_id).unwrap(), json!({"where": {"id": 7}}));
    }

    #[test]
    fn test_delete_target_from_row() {
        let target = DeleteTarget::from_row(&json!({"id": "abc", "title": "x"})).unwrap();
        assert_eq!(target, DeleteTarget::Id(EntityId::Text("abc".to_string())));

        assert_eq!(
            DeleteTarget::from_row(&json!({"title": "x"})),
            Err(ValidationError::MissingId)
        );
    }

    #[test]
    fn test_page_decodes_backend_shape() {
        let page: Page<JsonRecord> =
            serde_json::from_value(json!({"data": [{"id": 1}], "totalCount": 41})).unwrap();
        assert_eq!(page.len(), 1);

        let meta = page.meta(1, 20);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_pagination_meta_last_page() {
        let meta = PaginationMeta::new(3, 20, 41);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }
}
