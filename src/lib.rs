//! # Academy Admin
//!
//! Typed data layer of the HBS Academy admin dashboard: per-entity CRUD hooks
//! over a shared query cache, and the list + drawer page convention built on
//! top of them.
//!
//! ## Features
//!
//! - **Query Keys**: five canonical key roots per model (list, single, exist,
//!   count, aggregate), compared structurally
//! - **Read Hooks**: deduplicated, cached reads with `enabled` gating and a
//!   paginated variant driven by the URL
//! - **Write Hooks**: nine CRUD writes with invalidation, notifications and
//!   caller callbacks
//! - **Pages**: table columns, drawer form and URL-held drawer state
//! - **Configuration-Based**: backend, cache tuning and extra models from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use academy::prelude::*;
//!
//! let service = Arc::new(HttpService::new("https://api.hbs.academy")?);
//! let ctx = ApiContext::new(service, QueryClient::new(), Arc::new(TracingNotifier));
//!
//! let courses = ctx.entity::<Course>();
//! let mut list = courses.use_courses(FindArgs::new().take(10), ReadOptions::default());
//! let create = courses.use_create_course::<CourseRecord>(MutationOptions::new(), None);
//!
//! create.create_course(CourseRecord { title_uz: "Rust".into(), ..Default::default() });
//! println!("{:?}", list.settled().await.courses_data());
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod entities;
pub mod hooks;
pub mod pages;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        AdminError, BatchPayload, CrudOp, CrudService, DeleteTarget, Entity, EntityId,
        EntityModel, FieldFormat, FieldKind, FindArgs, JsonRecord, Notification,
        NotificationLevel, Notifier, Page, QueryKey, QueryKeyKind, RecordingNotifier,
        TracingNotifier, UpdateArgs, ValidationError, Where,
    };

    // === Cache ===
    pub use crate::cache::{
        MutationOptions, MutationState, MutationStatus, QueryClient, QueryClientConfig,
        QueryState, QueryStatus, RetryPolicy, SecondaryOptions,
    };

    // === Hooks ===
    pub use crate::hooks::{ApiContext, EntityHooks, MutationHandle, ReadHandle, ReadOptions, ReadResult};

    // === Entities ===
    pub use crate::entities::{
        Course, CourseCategory, CourseRecord, EntityRegistry, Mentor, MentorRecord, Product,
        ProductRecord,
    };

    // === Pages ===
    pub use crate::pages::{
        ColumnDescriptor, CrudPage, DrawerState, FieldDescriptor, FormSchema, LocationParams,
        PageConfig, PushOptions, Renderer, TableView,
    };

    // === Storage ===
    #[cfg(feature = "http")]
    pub use crate::storage::HttpService;
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryService;

    // === Config ===
    pub use crate::config::AdminConfig;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
