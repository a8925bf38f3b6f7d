//! Typed errors of the admin data layer
//!
//! Every failure a hook can observe is an [`AdminError`]. The type is `Clone`
//! because one fetch result is shared by every observer of a query key.
//!
//! # Error Categories
//!
//! - `Transport`: the request never produced an HTTP response
//! - `Backend`: the backend answered with a non-success status
//! - `Decode`: a response (or request) could not be (de)serialized
//! - `Validation`: the caller handed over something unusable (see [`ValidationError`])
//! - `Config`: the client could not be configured
//! - `Internal`: invariant broken inside this crate
//!
//! # Example
//!
//! ```rust,ignore
//! match handle.settled().await.error() {
//!     Some(AdminError::Backend { status: 404, .. }) => println!("gone"),
//!     Some(e) => notifier.error(e.user_message()),
//!     None => {}
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

/// The main error type of the crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdminError {
    /// Network or connection failure
    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },

    /// Error reported by the backend (validation, not found, conflict, ...)
    #[error("{path} responded with {status}: {}", backend_text(.status, .message))]
    Backend {
        path: String,
        status: u16,
        /// Message found in the body, `None` when the backend gave none
        message: Option<String>,
        body: Option<Value>,
    },

    /// Response body did not have the expected shape
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AdminError {
    pub fn transport(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AdminError::Transport {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a backend error, extracting the human readable message from the body
    pub fn backend(path: impl Into<String>, status: u16, body: Option<Value>) -> Self {
        let message = body.as_ref().and_then(extract_message);

        AdminError::Backend {
            path: path.into(),
            status,
            message,
            body,
        }
    }

    pub fn decode(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AdminError::Decode {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// HTTP status of a backend error
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message the backend supplied, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            AdminError::Backend { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::Transport { .. } => "TRANSPORT_ERROR",
            AdminError::Backend { status, .. } => match status {
                400 | 422 => "BACKEND_VALIDATION_ERROR",
                401 | 403 => "BACKEND_FORBIDDEN",
                404 => "BACKEND_NOT_FOUND",
                409 => "BACKEND_CONFLICT",
                _ => "BACKEND_ERROR",
            },
            AdminError::Decode { .. } => "DECODE_ERROR",
            AdminError::Validation(e) => e.error_code(),
            AdminError::Config(_) => "CONFIG_ERROR",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text suitable for an error notification
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Backend { status, message, .. } => backend_text(status, message),
            AdminError::Transport { .. } => "Network error, please try again".to_string(),
            AdminError::Validation(e) => e.to_string(),
            _ => "An error occurred!".to_string(),
        }
    }
}

fn backend_text(status: &u16, message: &Option<String>) -> String {
    message.clone().unwrap_or_else(|| format!("HTTP {status}"))
}

// The backend reports messages as `error_msg` or `message`, each either a
// string or a list of strings; for a list the last entry is the most specific.
fn extract_message(body: &Value) -> Option<String> {
    if let Value::String(text) = body {
        return (!text.is_empty()).then(|| text.clone());
    }

    ["error_msg", "message"].iter().find_map(|field| match body.get(field)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .rev()
            .find_map(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Caller-side problems detected before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("row has no usable `id`")]
    MissingId,

    #[error("no record has been loaded for editing")]
    NoRecordLoaded,

    #[error("the drawer is not open")]
    DrawerClosed,

    #[error("field '{field}': {message}")]
    Field { field: String, message: String },

    #[error("{} invalid field(s)", .0.len())]
    Fields(Vec<FieldIssue>),
}

/// One invalid form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingId => "MISSING_ID",
            ValidationError::NoRecordLoaded => "NO_RECORD_LOADED",
            ValidationError::DrawerClosed => "DRAWER_CLOSED",
            ValidationError::Field { .. } | ValidationError::Fields(_) => "VALIDATION_ERROR",
        }
    }

    /// Collapse a list of issues into a single error
    pub fn from_issues(mut issues: Vec<FieldIssue>) -> Self {
        if issues.len() == 1 {
            let issue = issues.remove(0);
            ValidationError::Field {
                field: issue.field,
                message: issue.message,
            }
        } else {
            ValidationError::Fields(issues)
        }
    }
}
