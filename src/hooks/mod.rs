//! Per-entity read and write hooks
//!
//! [`ApiContext`] bundles the three collaborators every hook needs: the
//! transport, the query cache and the notification sink. Hooks for one model
//! are obtained with [`ApiContext::entity`]:
//!
//! ```rust,ignore
//! let courses = ctx.entity::<Course>();
//! let mut list = courses.use_courses(FindArgs::new().take(10), ReadOptions::default());
//! let create = courses.use_create_course::<CourseRecord>(MutationOptions::new(), None);
//!
//! create.create_course(record);
//! let result = list.settled().await;
//! println!("{:?}", result.courses_data());
//! ```

pub mod read;
pub mod write;

pub use read::{ReadHandle, ReadOptions, ReadResult};
pub use write::{MutationHandle, op};

use crate::cache::{QueryClient, SecondaryOptions};
use crate::config::{AdminConfig, NotificationTexts};
use crate::core::entity::{Entity, EntityModel};
use crate::core::notify::Notifier;
use crate::core::operation::CrudOp;
use crate::core::query::JsonRecord;
use crate::core::query_key::QueryKeyKind;
use crate::core::service::CrudService;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// Shared collaborators of all hooks
#[derive(Clone)]
pub struct ApiContext {
    service: Arc<dyn CrudService>,
    client: QueryClient,
    notifier: Arc<dyn Notifier>,
    texts: NotificationTexts,
}

impl ApiContext {
    pub fn new(service: Arc<dyn CrudService>, client: QueryClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service,
            client,
            notifier,
            texts: NotificationTexts::default(),
        }
    }

    pub fn with_texts(mut self, texts: NotificationTexts) -> Self {
        self.texts = texts;
        self
    }

    /// Build the HTTP transport and query client described by `config`
    ///
    /// Starts the background garbage collector when `cache.gc_interval_ms` is
    /// set and a Tokio runtime is available.
    #[cfg(feature = "http")]
    pub fn from_config(config: &AdminConfig, notifier: Arc<dyn Notifier>) -> Result<Self, crate::core::AdminError> {
        let service = crate::storage::HttpService::from_config(&config.backend)?;
        Ok(Self::with_service(config, Arc::new(service), notifier))
    }

    /// Like [`from_config`](Self::from_config) with a caller-provided transport
    pub fn with_service(config: &AdminConfig, service: Arc<dyn CrudService>, notifier: Arc<dyn Notifier>) -> Self {
        let client = QueryClient::with_config(config.cache.client_config());
        if let Some(interval) = config.cache.gc_interval() {
            match tokio::runtime::Handle::try_current() {
                Ok(_) => {
                    client.spawn_garbage_collector(interval);
                }
                Err(_) => tracing::warn!("no tokio runtime, query garbage collector not started"),
            }
        }

        Self::new(service, client, notifier).with_texts(config.notifications.clone())
    }

    pub fn service(&self) -> &Arc<dyn CrudService> {
        &self.service
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn texts(&self) -> &NotificationTexts {
        &self.texts
    }

    /// Hooks of a statically declared model
    pub fn entity<E: Entity>(&self) -> EntityHooks<E> {
        EntityHooks {
            ctx: self.clone(),
            model: Arc::new(E::model().clone()),
            _entity: PhantomData,
        }
    }

    /// Hooks of a model declared at runtime (configuration)
    pub fn dynamic(&self, model: EntityModel) -> EntityHooks<DynamicEntity> {
        EntityHooks {
            ctx: self.clone(),
            model: Arc::new(model),
            _entity: PhantomData,
        }
    }
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("client", &self.client)
            .field("texts", &self.texts)
            .finish()
    }
}

/// Record type and alias namespace of models only known at runtime
///
/// Hooks created through [`ApiContext::dynamic`] carry their own model; the
/// placeholder returned by `model()` is never used for requests or keys.
pub struct DynamicEntity;

impl Entity for DynamicEntity {
    type Record = JsonRecord;

    fn model() -> &'static EntityModel {
        static MODEL: OnceLock<EntityModel> = OnceLock::new();
        MODEL.get_or_init(|| EntityModel::new("Dynamic", "Dynamic", "Dynamics"))
    }
}

/// Read and write hooks of one model
pub struct EntityHooks<E> {
    ctx: ApiContext,
    model: Arc<EntityModel>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityHooks<E> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            model: Arc::clone(&self.model),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for EntityHooks<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHooks")
            .field("model", &self.model.name)
            .finish()
    }
}

impl<E: Entity> EntityHooks<E> {
    pub fn model(&self) -> &EntityModel {
        &self.model
    }

    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    /// Side effects applied when a write hook gets no secondary options:
    /// every view of the model is invalidated and the configured texts shown
    pub fn default_secondary(&self, op: CrudOp) -> SecondaryOptions {
        let texts = &self.ctx.texts;
        let success = match op {
            CrudOp::CreateOne | CrudOp::CreateMany | CrudOp::CreateList => &texts.create_success,
            CrudOp::UpdateOne | CrudOp::UpdateMany | CrudOp::UpdateList => &texts.update_success,
            _ => &texts.delete_success,
        };

        SecondaryOptions::new()
            .invalidate_all(QueryKeyKind::ALL.into_iter().map(|kind| self.model.keys.key(kind)))
            .success_toast(success.clone())
            .error_toast(texts.error.clone())
    }
}
