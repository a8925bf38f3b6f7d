//! Typed rows for the models the dashboard edits the most
//!
//! Unknown or relation fields (`category`, `mentor`, counts from `include`)
//! are kept in `extra`, so a record survives a round trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A course of the academy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title_uz: String,
    pub title_ru: Option<String>,
    pub title_en: Option<String>,
    pub description_uz: Option<String>,
    pub description_ru: Option<String>,
    pub description_en: Option<String>,
    pub cover_image: Option<String>,
    /// Minutes
    pub duration: Option<u32>,
    pub level: Option<String>,
    pub price: f64,
    pub is_published: bool,
    pub category_id: Option<String>,
    pub mentor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A mentor teaching courses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MentorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub photo: Option<String>,
    pub specialization: Option<String>,
    /// Years
    pub experience: Option<u32>,
    pub rating: Option<f64>,
    pub total_students: Option<u64>,
    pub total_courses: Option<u64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MentorRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Coin shop product level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductLevel {
    #[default]
    Level1,
    Level2,
    Level3,
}

/// A product of the coin shop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name_uz: String,
    pub name_ru: Option<String>,
    pub name_en: Option<String>,
    pub description_uz: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub price: f64,
    pub level: ProductLevel,
    pub min_coins_required: u64,
    pub stock: u64,
    pub is_available: bool,
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
