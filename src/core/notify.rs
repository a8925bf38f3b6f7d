//! User-facing notifications (toasts)

use crate::core::error::AdminError;
use std::sync::{Mutex, PoisonError};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A message shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for notifications emitted after mutations
///
/// The UI layer implements this to display toasts. Implementations must not
/// block: notifications are emitted from inside mutation futures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(NotificationLevel::Success, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(NotificationLevel::Error, message));
    }

    fn info(&self, message: &str) {
        self.notify(Notification::new(NotificationLevel::Info, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notification::new(NotificationLevel::Warning, message));
    }
}

/// Report an error using the message the backend supplied, if any
pub fn notify_error(notifier: &dyn Notifier, fallback: Option<&str>, error: &AdminError) {
    let message = match (error.backend_message(), error, fallback) {
        (Some(text), _, _) => text.to_string(),
        (None, AdminError::Validation(_), _) | (None, _, None) => error.user_message(),
        (None, _, Some(text)) => text.to_string(),
    };
    notifier.error(&message);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!(message = %notification.message, "notification"),
            NotificationLevel::Warning => tracing::warn!(message = %notification.message, "notification"),
            _ => tracing::info!(level = ?notification.level, message = %notification.message, "notification"),
        }
    }
}

/// Notifier that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_notifier_levels() {
        let notifier = RecordingNotifier::new();
        notifier.success("Saved");
        notifier.error("Failed");

        assert_eq!(notifier.messages(NotificationLevel::Success), vec!["Saved"]);
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["Failed"]);
        assert_eq!(notifier.take().len(), 2);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn test_notify_error_prefers_backend_message() {
        let notifier = RecordingNotifier::new();
        let err = AdminError::backend("api/course/delete", 409, Some(json!({"message": "Course has students"})));

        notify_error(&notifier, Some("Could not delete"), &err);
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["Course has students"]);
    }

    #[test]
    fn test_notify_error_uses_fallback_without_backend_message() {
        let notifier = RecordingNotifier::new();
        let err = AdminError::backend("api/course/delete", 500, None);

        notify_error(&notifier, Some("Could not delete"), &err);
        notify_error(&notifier, None, &err);
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["Could not delete", "HTTP 500"]);
    }

    #[test]
    fn test_notify_error_uses_fallback_for_transport() {
        let notifier = RecordingNotifier::new();
        let err = AdminError::transport("api/course/delete", "connection refused");

        notify_error(&notifier, Some("Could not delete"), &err);
        assert_eq!(notifier.messages(NotificationLevel::Error), vec!["Could not delete"]);
    }
}
