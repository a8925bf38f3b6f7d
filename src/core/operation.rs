//! The CRUD verbs exposed by every backend model

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method used for a verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated CRUD operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrudOp {
    Count,
    Exist,
    FindMany,
    FindOne,
    CreateOne,
    CreateMany,
    CreateList,
    UpdateOne,
    UpdateMany,
    UpdateList,
    DeleteOne,
    DeleteMany,
    DeleteAll,
}

impl CrudOp {
    pub const ALL: [CrudOp; 13] = [
        CrudOp::Count,
        CrudOp::Exist,
        CrudOp::FindMany,
        CrudOp::FindOne,
        CrudOp::CreateOne,
        CrudOp::CreateMany,
        CrudOp::CreateList,
        CrudOp::UpdateOne,
        CrudOp::UpdateMany,
        CrudOp::UpdateList,
        CrudOp::DeleteOne,
        CrudOp::DeleteMany,
        CrudOp::DeleteAll,
    ];

    /// Last path segment of the REST endpoint
    pub fn path(&self) -> &'static str {
        match self {
            CrudOp::Count => "count",
            CrudOp::Exist => "exist",
            CrudOp::FindMany => "find-many",
            CrudOp::FindOne => "find-first",
            CrudOp::CreateOne => "create",
            CrudOp::CreateMany => "create-many",
            CrudOp::CreateList => "create-list",
            CrudOp::UpdateOne => "update",
            CrudOp::UpdateMany => "update-many",
            CrudOp::UpdateList => "update-list",
            CrudOp::DeleteOne => "delete",
            CrudOp::DeleteMany => "delete-many",
            CrudOp::DeleteAll => "delete-all",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            CrudOp::UpdateOne | CrudOp::UpdateMany | CrudOp::UpdateList => HttpMethod::Patch,
            _ => HttpMethod::Post,
        }
    }

    /// Operation name as used in logs (`findMany`, `deleteOne`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            CrudOp::Count => "count",
            CrudOp::Exist => "exist",
            CrudOp::FindMany => "findMany",
            CrudOp::FindOne => "findOne",
            CrudOp::CreateOne => "createOne",
            CrudOp::CreateMany => "createMany",
            CrudOp::CreateList => "createList",
            CrudOp::UpdateOne => "updateOne",
            CrudOp::UpdateMany => "updateMany",
            CrudOp::UpdateList => "updateList",
            CrudOp::DeleteOne => "deleteOne",
            CrudOp::DeleteMany => "deleteMany",
            CrudOp::DeleteAll => "deleteAll",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            CrudOp::Count | CrudOp::Exist | CrudOp::FindMany | CrudOp::FindOne
        )
    }

    /// Whether the request is sent without a body
    pub fn is_bodyless(&self) -> bool {
        matches!(self, CrudOp::DeleteAll)
    }
}

impl fmt::Display for CrudOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
