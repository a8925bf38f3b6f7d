//! Query keys identifying cache partitions
//!
//! A key is an ordered tuple of JSON values. Two keys are the same partition when
//! their values are structurally equal, regardless of object key order.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of one cached result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    /// Create a key with a single root element (e.g. `"courses"`)
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![Value::String(root.into())])
    }

    /// Build a key from raw parts
    pub fn from_parts(parts: Vec<Value>) -> Self {
        Self(parts)
    }

    /// Append one variable part to the key
    ///
    /// Values that fail to serialize are stored as `null`; key parts are plain
    /// data (filters, pagination) so this never happens in practice.
    pub fn with(mut self, part: impl Serialize) -> Self {
        self.0.push(serde_json::to_value(part).unwrap_or(Value::Null));
        self
    }

    /// The root element as a string, if it is one
    pub fn root(&self) -> Option<&str> {
        self.0.first().and_then(Value::as_str)
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` matches the first elements of this key
    ///
    /// This is the matching rule used by invalidation: invalidating `["courses"]`
    /// reaches `["courses", {...}]` but not `["course", {...}]`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.0.len() <= self.0.len() && prefix.0.iter().zip(&self.0).all(|(a, b)| a == b)
    }
}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for part in &self.0 {
            hash_value(part, state);
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl From<&str> for QueryKey {
    fn from(root: &str) -> Self {
        Self::new(root)
    }
}

// Object keys are hashed in sorted order so the hash agrees with `Value`'s
// order-insensitive equality.
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                key.hash(state);
                hash_value(item, state);
            }
        }
    }
}

/// The view a query key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKeyKind {
    List,
    Single,
    Exist,
    Count,
    Aggregate,
}

impl QueryKeyKind {
    pub const ALL: [QueryKeyKind; 5] = [
        QueryKeyKind::List,
        QueryKeyKind::Single,
        QueryKeyKind::Exist,
        QueryKeyKind::Count,
        QueryKeyKind::Aggregate,
    ];
}

/// Canonical key roots of one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKeys {
    pub list: String,
    pub single: String,
    pub exist: String,
    pub count: String,
    pub aggregate: String,
}

impl QueryKeys {
    /// Derive the key roots from kebab-case singular and plural names
    pub fn derive(singular_kebab: &str, plural_kebab: &str) -> Self {
        Self {
            list: plural_kebab.to_string(),
            single: singular_kebab.to_string(),
            exist: format!("exist-{singular_kebab}"),
            count: format!("count-{plural_kebab}"),
            aggregate: format!("aggregate-{plural_kebab}"),
        }
    }

    pub fn root(&self, kind: QueryKeyKind) -> &str {
        match kind {
            QueryKeyKind::List => &self.list,
            QueryKeyKind::Single => &self.single,
            QueryKeyKind::Exist => &self.exist,
            QueryKeyKind::Count => &self.count,
            QueryKeyKind::Aggregate => &self.aggregate,
        }
    }

    pub fn key(&self, kind: QueryKeyKind) -> QueryKey {
        QueryKey::new(self.root(kind))
    }

    pub fn list(&self) -> QueryKey {
        self.key(QueryKeyKind::List)
    }

    pub fn single(&self) -> QueryKey {
        self.key(QueryKeyKind::Single)
    }

    pub fn exist(&self) -> QueryKey {
        self.key(QueryKeyKind::Exist)
    }

    pub fn count(&self) -> QueryKey {
        self.key(QueryKeyKind::Count)
    }

    pub fn aggregate(&self) -> QueryKey {
        self.key(QueryKeyKind::Aggregate)
    }
}
