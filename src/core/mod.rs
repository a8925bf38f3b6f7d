//! Core module containing the CRUD contract shared by every entity

pub mod entity;
pub mod error;
pub mod field;
pub mod notify;
pub mod operation;
pub mod pluralize;
pub mod query;
pub mod query_key;
pub mod service;

pub use entity::{Entity, EntityModel};
pub use error::{AdminError, FieldIssue, ValidationError};
pub use field::{FieldFormat, FieldKind};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use operation::{CrudOp, HttpMethod};
pub use pluralize::Pluralizer;
pub use query::{
    BatchPayload, CreateArgs, DeleteArgs, DeleteTarget, EntityId, FindArgs, JsonRecord, Page,
    PaginationMeta, UpdateArgs, Where,
};
pub use query_key::{QueryKey, QueryKeyKind, QueryKeys};
pub use service::CrudService;
