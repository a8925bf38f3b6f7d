//! Configuration loading and management

use crate::cache::{QueryClientConfig, RetryPolicy};
use crate::core::entity::EntityModel;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Where the CRUD backend lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://api.hbs.academy`
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Query cache tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub stale_time_ms: u64,
    pub gc_time_ms: u64,
    pub retry: u32,
    pub retry_delay_ms: u64,
    pub retry_delay_cap_ms: u64,

    /// Period of the background garbage collector; `None` disables it
    pub gc_interval_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 0,
            gc_time_ms: 5 * 60 * 1000,
            retry: 3,
            retry_delay_ms: 1000,
            retry_delay_cap_ms: 30_000,
            gc_interval_ms: None,
        }
    }
}

impl CacheConfig {
    pub fn client_config(&self) -> QueryClientConfig {
        QueryClientConfig {
            stale_time: Duration::from_millis(self.stale_time_ms),
            gc_time: Duration::from_millis(self.gc_time_ms),
            retry: RetryPolicy {
                retries: self.retry,
                base_delay: Duration::from_millis(self.retry_delay_ms),
                max_delay: Duration::from_millis(self.retry_delay_cap_ms),
            },
        }
    }

    pub fn gc_interval(&self) -> Option<Duration> {
        self.gc_interval_ms.map(Duration::from_millis)
    }
}

/// Default notification texts of the write hooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationTexts {
    pub create_success: String,
    pub update_success: String,
    pub delete_success: String,
    pub error: String,
}

impl Default for NotificationTexts {
    fn default() -> Self {
        Self {
            create_success: "Muvaffaqiyatli saqlandi".to_string(),
            update_success: "Muvaffaqiyatli o'zgartirildi".to_string(),
            delete_success: "Muvaffaqiyatli o'chirildi".to_string(),
            error: "Xatolik sodir bo'ldi".to_string(),
        }
    }
}

/// A backend model declared at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Model name (e.g., "LeadStatus")
    pub name: String,

    /// Singular form; defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular: Option<String>,

    /// Plural form; derived from the singular when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
}

impl EntityConfig {
    pub fn model(&self) -> EntityModel {
        let singular = self.singular.clone().unwrap_or_else(|| self.name.clone());
        let plural = self
            .plural
            .clone()
            .unwrap_or_else(|| crate::core::Pluralizer::pluralize(&singular));
        EntityModel::new(self.name.clone(), singular, plural)
    }
}

/// Complete configuration of the admin data layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub notifications: NotificationTexts,

    /// Models in addition to the built-in ones
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

impl AdminConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("backend.base_url must be an http(s) URL, got '{url}'");
        }
        if self.backend.timeout_secs == 0 {
            bail!("backend.timeout_secs must be positive");
        }
        if let Some(entity) = self.entities.iter().find(|e| e.name.trim().is_empty()) {
            bail!("entity declared without a name: {entity:?}");
        }
        Ok(())
    }

    /// Overlay `other` on top of this configuration
    ///
    /// Scalar sections are replaced; entities are appended, with a later
    /// declaration of the same name replacing the earlier one.
    pub fn merge(mut self, other: AdminConfig) -> Self {
        self.backend = other.backend;
        self.cache = other.cache;
        self.notifications = other.notifications;

        for entity in other.entities {
            match self.entities.iter_mut().find(|e| e.name == entity.name) {
                Some(existing) => *existing = entity,
                None => self.entities.push(entity),
            }
        }
        self
    }

    /// Create a default configuration for testing
    pub fn default_config() -> Self {
        Self {
            entities: vec![EntityConfig {
                name: "LeadSource".to_string(),
                singular: None,
                plural: None,
            }],
            ..Self::default()
        }
    }

    /// Runtime models of the declared entities
    pub fn models(&self) -> Vec<EntityModel> {
        self.entities.iter().map(EntityConfig::model).collect()
    }
}
