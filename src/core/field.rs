//! Form field kinds and value formats

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Editor kind of a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Switch,
    /// Single choice among fixed variants
    Select(Vec<String>),
    /// Reference to another entity's record id
    Relation(String),
    Date,
    Image,
}

impl FieldKind {
    /// The value a create payload falls back to when the field is empty
    pub fn implicit_default(&self) -> Option<Value> {
        match self {
            FieldKind::Number => Some(Value::from(0)),
            FieldKind::Switch => Some(Value::Bool(false)),
            FieldKind::Select(variants) => variants.first().cloned().map(Value::String),
            _ => None,
        }
    }
}

/// Field format validators applied on submit
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Url,
    Phone,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a field value against this format
    ///
    /// Only strings can match; numbers and booleans never do.
    pub fn validate(&self, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            return false;
        };

        match self {
            FieldFormat::Email => Self::is_valid_email(text),
            FieldFormat::Url => Self::is_valid_url(text),
            FieldFormat::Phone => Self::is_valid_phone(text),
            FieldFormat::Custom(regex) => regex.is_match(text),
        }
    }

    /// Human readable reason used in validation messages
    pub fn describe(&self) -> &'static str {
        match self {
            FieldFormat::Email => "must be a valid email",
            FieldFormat::Url => "must be a valid URL",
            FieldFormat::Phone => "must be a valid phone number",
            FieldFormat::Custom(_) => "has an invalid format",
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static email pattern")
        });
        regex.is_match(email)
    }

    fn is_valid_url(url: &str) -> bool {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("static url pattern"));
        regex.is_match(url)
    }

    // Uzbek numbers are written +998 XX XXX XX XX; spaces and dashes are ignored
    fn is_valid_phone(phone: &str) -> bool {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PHONE_REGEX.get_or_init(|| Regex::new(r"^\+?[1-9]\d{7,14}$").expect("static phone pattern"));
        let compact: String = phone.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        regex.is_match(&compact)
    }
}
