//! Entity registry: every model known to the dashboard, by name
//!
//! Built-in models come from `define_entities!`; configuration may declare
//! more. Registration rejects any model whose query key roots collide with
//! an already registered one, because two models sharing a root would
//! invalidate each other's views.

use crate::core::entity::EntityModel;
use crate::core::query_key::QueryKeyKind;
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("model '{0}' is already registered")]
    DuplicateModel(String),

    #[error("query key '{root}' of '{model}' is already used by '{owner}'")]
    KeyCollision {
        root: String,
        model: String,
        owner: String,
    },
}

/// Registry of model descriptors, in registration order
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    models: IndexMap<String, EntityModel>,
    roots: IndexMap<String, (String, QueryKeyKind)>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in model
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for model in super::all_models() {
            if let Err(error) = registry.register(model.clone()) {
                tracing::error!(error = %error, "built-in model rejected");
            }
        }
        registry
    }

    /// Register a model descriptor
    pub fn register(&mut self, model: EntityModel) -> Result<(), RegistryError> {
        if self.models.contains_key(&model.name) {
            return Err(RegistryError::DuplicateModel(model.name));
        }

        for (_, root) in model.key_roots() {
            if let Some((owner, _)) = self.roots.get(root) {
                return Err(RegistryError::KeyCollision {
                    root: root.to_string(),
                    model: model.name.clone(),
                    owner: owner.clone(),
                });
            }
        }

        for (kind, root) in model.key_roots() {
            self.roots
                .insert(root.to_string(), (model.name.clone(), kind));
        }
        tracing::debug!(model = %model.name, "registered model");
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    /// Register several models, stopping at the first rejected one
    pub fn extend(&mut self, models: impl IntoIterator<Item = EntityModel>) -> Result<(), RegistryError> {
        for model in models {
            self.register(model)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&EntityModel> {
        self.models.get(name)
    }

    /// Model owning a query key root, with the view the root stands for
    pub fn owner_of(&self, root: &str) -> Option<(&EntityModel, QueryKeyKind)> {
        let (name, kind) = self.roots.get(root)?;
        self.models.get(name).map(|model| (model, *kind))
    }

    /// Get all registered model names
    pub fn entity_types(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn models(&self) -> impl Iterator<Item = &EntityModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
