//! Push events and the notifications they produce.

use serde::{Deserialize, Serialize};

use super::Worker;

const DEFAULT_TITLE: &str = "Portfolio Update";
const DEFAULT_BODY: &str = "New update available";
const ICON: &str = "/icon-192.png";

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
}

/// A notification to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds.
    pub vibrate: Vec<u32>,
}

impl Notification {
    /// Build the notification for a push message. Missing, empty or
    /// malformed fields fall back to the defaults.
    pub fn from_push(data: Option<&[u8]>) -> Self {
        let payload = match data {
            Some(bytes) => serde_json::from_slice::<PushPayload>(bytes).unwrap_or_else(|e| {
                tracing::warn!("malformed push payload, using defaults: {e}");
                PushPayload::default()
            }),
            None => PushPayload::default(),
        };

        let or_default = |value: Option<String>, default: &str| {
            value.filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        };

        Self {
            title: or_default(payload.title, DEFAULT_TITLE),
            body: or_default(payload.body, DEFAULT_BODY),
            icon: ICON.to_string(),
            badge: ICON.to_string(),
            vibrate: vec![200, 100, 200],
        }
    }
}

/// Displays notifications.
pub trait Notifier: Send + Sync {
    fn show(&self, notification: &Notification);
}

/// Logs notifications instead of displaying them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, notification: &Notification) {
        tracing::info!(
            title = %notification.title,
            body = %notification.body,
            icon = %notification.icon,
            "notification"
        );
    }
}

impl Worker {
    /// Handle a push message: build its notification and show it.
    pub fn handle_push(&self, data: Option<&[u8]>) -> Notification {
        let notification = Notification::from_push(data);
        self.notifier.show(&notification);
        notification
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{site, worker_with};
    use super::*;
    use folio_core::AppConfig;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        shown: Mutex<Vec<Notification>>,
    }

    impl Notifier for Recorder {
        fn show(&self, notification: &Notification) {
            self.shown.lock().unwrap().push(notification.clone());
        }
    }

    #[test]
    fn test_defaults_without_payload() {
        let n = Notification::from_push(None);
        assert_eq!(n.title, "Portfolio Update");
        assert_eq!(n.body, "New update available");
        assert_eq!(n.icon, "/icon-192.png");
        assert_eq!(n.badge, "/icon-192.png");
        assert_eq!(n.vibrate, vec![200, 100, 200]);
    }

    #[test]
    fn test_payload_fields() {
        let n = Notification::from_push(Some(br#"{"title":"New post","body":"Rust at work"}"#));
        assert_eq!(n.title, "New post");
        assert_eq!(n.body, "Rust at work");
    }

    #[test]
    fn test_partial_and_empty_fields() {
        let n = Notification::from_push(Some(br#"{"title":"","body":"Only body"}"#));
        assert_eq!(n.title, "Portfolio Update");
        assert_eq!(n.body, "Only body");
    }

    #[test]
    fn test_malformed_payload_uses_defaults() {
        let n = Notification::from_push(Some(b"not json"));
        assert_eq!(n, Notification::from_push(None));
    }

    #[tokio::test]
    async fn test_worker_shows_notification() {
        let config = AppConfig::default();
        let recorder = Arc::new(Recorder::default());
        let worker = worker_with(config.clone(), site(&config)).await.with_notifier(recorder.clone());

        let shown = worker.handle_push(Some(br#"{"title":"Hello"}"#));
        assert_eq!(shown.title, "Hello");
        assert_eq!(recorder.shown.lock().unwrap().as_slice(), &[shown]);
    }
}
