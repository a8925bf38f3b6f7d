//! Entity traits and runtime model descriptors

use crate::core::pluralize::Pluralizer;
use crate::core::query_key::{QueryKeyKind, QueryKeys};
use convert_case::{Case, Casing};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Names and derived identifiers of one backend model
///
/// Everything here is a pure function of the three names, so two processes
/// describing the same model always agree on paths and query keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityModel {
    /// Model name as the backend knows it (e.g. `"CourseCategory"`)
    pub name: String,

    /// Singular form (e.g. `"CourseCategory"`)
    pub singular: String,

    /// Plural form (e.g. `"CourseCategories"`)
    pub plural: String,

    /// REST path segment: `/api/<segment>/<verb>`
    pub path_segment: String,

    /// Ad-hoc aggregate endpoint
    pub aggregate_path: String,

    /// Canonical query key roots
    pub keys: QueryKeys,
}

impl EntityModel {
    pub fn new(
        name: impl Into<String>,
        singular: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let singular = singular.into();
        let plural = plural.into();

        let path_segment = name.to_case(Case::Camel);
        let aggregate_path = format!("/api/{}/aggregate", singular.to_case(Case::Camel));
        let keys = QueryKeys::derive(&singular.to_case(Case::Kebab), &plural.to_case(Case::Kebab));

        Self {
            name,
            singular,
            plural,
            path_segment,
            aggregate_path,
            keys,
        }
    }

    /// Create a model whose singular is its name and whose plural is derived
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let plural = Pluralizer::pluralize(&name);
        Self::new(name.clone(), name, plural)
    }

    /// Path of one CRUD verb, relative to the backend base URL
    pub fn operation_path(&self, verb_path: &str) -> String {
        format!("api/{}/{}", self.path_segment, verb_path)
    }

    /// All key roots of this model, tagged with their view
    pub fn key_roots(&self) -> impl Iterator<Item = (QueryKeyKind, &str)> {
        QueryKeyKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.keys.root(kind)))
    }
}

/// Compile-time binding between a marker type and a backend model.
///
/// Implemented by `define_entities!` for every model the dashboard manages.
/// `Record` is the row type returned by reads; untyped models use
/// [`JsonRecord`](crate::core::query::JsonRecord).
pub trait Entity: Send + Sync + 'static {
    /// Row type decoded from read responses
    type Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;

    /// The runtime descriptor of this model
    fn model() -> &'static EntityModel;

    /// Model name (e.g. "Course")
    fn name() -> &'static str {
        &Self::model().name
    }

    /// Plural name (e.g. "Courses")
    fn plural() -> &'static str {
        &Self::model().plural
    }

    fn keys() -> &'static QueryKeys {
        &Self::model().keys
    }
}
