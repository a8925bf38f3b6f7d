//! Drawer form: field descriptors, payload building and validation
//!
//! A create payload fills empty fields with their create default; an update
//! payload sends exactly what the form holds. Both only carry the fields the
//! schema declares.

use crate::core::error::{FieldIssue, ValidationError};
use crate::core::field::{FieldFormat, FieldKind};
use serde_json::{Map, Value};

/// One editable field of an entity form
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Key in the payload (e.g. `"titleUz"`)
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Overrides the kind's implicit create default
    pub default: Option<Value>,
    pub format: Option<FieldFormat>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            default: None,
            format: None,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Value a create payload uses when the form left this field empty
    pub fn create_default(&self) -> Option<Value> {
        self.default
            .clone()
            .or_else(|| self.kind.implicit_default())
    }

    fn check(&self, value: Option<&Value>) -> Option<FieldIssue> {
        let present = value.filter(|v| !is_empty(v));
        match present {
            None if self.required => Some(FieldIssue {
                field: self.name.clone(),
                message: "This field is required".to_string(),
            }),
            Some(value) => {
                let format = self.format.as_ref()?;
                (!format.validate(value)).then(|| FieldIssue {
                    field: self.name.clone(),
                    message: format.describe().to_string(),
                })
            }
            None => None,
        }
    }
}

/// Null, absent and blank strings all count as "not filled in"
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Ordered field list of one entity form
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Check required fields and formats, reporting every issue at once
    pub fn validate(&self, values: &Map<String, Value>) -> Result<(), ValidationError> {
        let issues: Vec<FieldIssue> = self
            .fields
            .iter()
            .filter_map(|field| field.check(values.get(&field.name)))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_issues(issues))
        }
    }

    /// Payload of an add: declared fields, empty ones replaced by their
    /// create default, fields without value or default left out
    pub fn create_payload(&self, values: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut payload = Map::new();
        for field in &self.fields {
            let value = values
                .get(&field.name)
                .filter(|v| !is_empty(v))
                .cloned()
                .or_else(|| field.create_default());
            if let Some(value) = value {
                payload.insert(field.name.clone(), value);
            }
        }

        self.validate(&payload)?;
        Ok(payload)
    }

    /// Payload of an edit: declared fields exactly as the form holds them
    pub fn update_payload(&self, values: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        self.validate(values)?;

        Ok(self
            .fields
            .iter()
            .filter_map(|field| {
                values
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect())
    }
}

/// Values currently held by the drawer form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Fill the form from a loaded record, keeping only declared fields
    pub fn load(&mut self, schema: &FormSchema, record: &Value) {
        self.values = schema
            .fields()
            .iter()
            .filter_map(|field| {
                record
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// One choice of a select or relation field
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

/// Options of a relation field: each row's `id` labelled by `label`
///
/// Rows without an id are skipped.
pub fn make_options<'a>(
    rows: impl IntoIterator<Item = &'a Value>,
    label: impl Fn(&Value) -> String,
) -> Vec<SelectOption> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").filter(|id| !id.is_null())?;
            Some(SelectOption {
                value: id.clone(),
                label: label(row),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldDescriptor::text("titleUz", "Title Uz").required(),
            FieldDescriptor::new("price", "Price", FieldKind::Number).required(),
            FieldDescriptor::new("isPublished", "Is Published", FieldKind::Switch),
            FieldDescriptor::new(
                "level",
                "Level",
                FieldKind::Select(vec!["beginner".into(), "advanced".into()]),
            ),
            FieldDescriptor::text("email", "Email").format(FieldFormat::Email),
            FieldDescriptor::text("titleRu", "Title Ru"),
        ])
    }

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("form values must be an object"),
        }
    }

    #[test]
    fn test_create_payload_applies_defaults() {
        let payload = schema()
            .create_payload(&values(json!({"titleUz": "Rust", "extra": 1})))
            .unwrap();

        assert_eq!(
            Value::Object(payload),
            json!({"titleUz": "Rust", "price": 0, "isPublished": false, "level": "beginner"})
        );
    }

    #[test]
    fn test_create_payload_keeps_explicit_false() {
        let payload = schema()
            .create_payload(&values(json!({"titleUz": "Rust", "isPublished": false, "price": 5})))
            .unwrap();
        assert_eq!(payload["isPublished"], false);
        assert_eq!(payload["price"], 5);
    }

    #[test]
    fn test_update_payload_sends_values_as_given() {
        let payload = schema()
            .update_payload(&values(json!({"titleUz": "Rust", "price": 10, "isPublished": true})))
            .unwrap();
        assert_eq!(
            Value::Object(payload),
            json!({"titleUz": "Rust", "price": 10, "isPublished": true})
        );
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let error = schema()
            .update_payload(&values(json!({"titleUz": "  "})))
            .unwrap_err();

        match error {
            ValidationError::Fields(issues) => {
                let names: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(names, vec!["titleUz", "price"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_format_checked_only_when_filled() {
        let schema = schema();
        assert!(schema.validate(&values(json!({"titleUz": "a", "price": 1}))).is_ok());

        let error = schema
            .validate(&values(json!({"titleUz": "a", "price": 1, "email": "nope"})))
            .unwrap_err();
        assert_eq!(
            error,
            ValidationError::Field {
                field: "email".to_string(),
                message: "must be a valid email".to_string()
            }
        );
    }

    #[test]
    fn test_form_state_load_keeps_declared_fields() {
        let mut state = FormState::new();
        state.load(&schema(), &json!({"id": 7, "titleUz": "Rust", "price": 3, "category": {}}));

        assert_eq!(state.get("titleUz"), Some(&json!("Rust")));
        assert!(state.get("id").is_none());
        assert!(state.get("category").is_none());
    }

    #[test]
    fn test_make_options() {
        let rows = vec![
            json!({"id": 1, "firstName": "Aziz", "lastName": "Karimov"}),
            json!({"firstName": "No", "lastName": "Id"}),
        ];
        let options = make_options(&rows, |row| {
            format!("{} {}", row["firstName"].as_str().unwrap_or(""), row["lastName"].as_str().unwrap_or(""))
        });

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, json!(1));
        assert_eq!(options[0].label, "Aziz Karimov");
    }
}
