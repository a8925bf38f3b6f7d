//! Add/edit drawer state machine
//!
//! The drawer has no state of its own: it is read from the `add`, `edit` and
//! `id` query parameters, and every transition is a location push.

use super::location::{LocationParams, PushOptions};
use crate::core::error::ValidationError;
use crate::core::query::EntityId;
use serde_json::{Map, Value};

/// What the page currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerState {
    /// Table only
    List,
    /// Drawer open with an empty form
    Add,
    /// Drawer open on an existing record
    Edit { id: Option<EntityId> },
}

impl DrawerState {
    /// Derive the state from the URL; `add` wins over `edit`
    pub fn from_location(location: &LocationParams) -> Self {
        if location.flag("add") {
            DrawerState::Add
        } else if location.flag("edit") {
            DrawerState::Edit {
                id: location.get("id").and_then(EntityId::from_value),
            }
        } else {
            DrawerState::List
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DrawerState::List)
    }

    pub fn edit_id(&self) -> Option<&EntityId> {
        match self {
            DrawerState::Edit { id } => id.as_ref(),
            _ => None,
        }
    }
}

/// Open the drawer in add mode
pub fn open_add(location: &mut LocationParams) {
    let mut params = Map::new();
    params.insert("add".to_string(), Value::Bool(true));
    params.insert("edit".to_string(), Value::Null);
    params.insert("id".to_string(), Value::Null);
    location.push(params, PushOptions::update());
}

/// Open the drawer on `row`, which must carry an `id`
pub fn open_edit(location: &mut LocationParams, row: &Value) -> Result<EntityId, ValidationError> {
    let id = row
        .get("id")
        .and_then(EntityId::from_value)
        .ok_or(ValidationError::MissingId)?;

    let mut params = Map::new();
    params.insert("add".to_string(), Value::Null);
    params.insert("edit".to_string(), Value::Bool(true));
    params.insert("id".to_string(), id.to_value());
    location.push(params, PushOptions::update());
    Ok(id)
}

/// Close the drawer, keeping every other parameter (pagination, filters)
pub fn close(location: &mut LocationParams) {
    let params = ["add", "edit", "id"]
        .into_iter()
        .map(|name| (name.to_string(), Value::Null))
        .collect();
    location.push(params, PushOptions::update());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transitions() {
        let mut location = LocationParams::parse("/admin/courses?pageSize=10");
        assert_eq!(DrawerState::from_location(&location), DrawerState::List);

        open_add(&mut location);
        assert_eq!(DrawerState::from_location(&location), DrawerState::Add);

        close(&mut location);
        assert_eq!(location.to_url(), "/admin/courses?pageSize=10");

        let id = open_edit(&mut location, &json!({"id": 42, "titleUz": "Rust"})).unwrap();
        assert_eq!(id, EntityId::Int(42));
        assert_eq!(location.to_url(), "/admin/courses?edit=true&id=42&pageSize=10");

        let state = DrawerState::from_location(&location);
        assert_eq!(state.edit_id(), Some(&EntityId::Int(42)));

        close(&mut location);
        assert!(!DrawerState::from_location(&location).is_open());
    }

    #[test]
    fn test_open_edit_requires_id() {
        let mut location = LocationParams::parse("/admin/courses");
        assert_eq!(
            open_edit(&mut location, &json!({"titleUz": "Rust"})),
            Err(ValidationError::MissingId)
        );
        assert_eq!(location.history().len(), 1);
    }

    #[test]
    fn test_uuid_ids_survive_the_url() {
        let mut location = LocationParams::parse("/admin/mentors");
        open_edit(&mut location, &json!({"id": "0f63153d-bf5b-42aa-80b3-b7a66e4605dd"})).unwrap();

        let reloaded = LocationParams::parse(&location.to_url());
        assert_eq!(
            DrawerState::from_location(&reloaded).edit_id(),
            Some(&EntityId::Text("0f63153d-bf5b-42aa-80b3-b7a66e4605dd".to_string()))
        );
    }
}
