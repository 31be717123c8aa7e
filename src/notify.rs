//! Transient user notifications ("toasts").
//!
//! Fire-and-forget: callers never learn whether anyone saw the message.

use serde::Serialize;
use tokio::sync::broadcast;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// A one-line message with optional detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
            description: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
            description: None,
        }
    }

    pub fn info(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
            description: Some(description.into()),
        }
    }
}

/// Sink for toasts.
pub trait Notifier: Send {
    fn notify(&self, toast: Toast);
}

/// Logs toasts and fans them out to every connected browser.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Toast>,
}

impl BroadcastNotifier {
    #[must_use]
    pub fn new(tx: broadcast::Sender<Toast>) -> Self {
        Self { tx }
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, toast: Toast) {
        log_toast(&toast);
        // No subscribers is fine
        let _ = self.tx.send(toast);
    }
}

fn log_toast(toast: &Toast) {
    match toast.level {
        ToastLevel::Error => tracing::warn!("toast: {}", toast.message),
        ToastLevel::Success | ToastLevel::Info => tracing::info!("toast: {}", toast.message),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let (tx, mut rx) = broadcast::channel(4);
        let notifier = BroadcastNotifier::new(tx);

        notifier.notify(Toast::success("Data refreshed successfully"));

        let toast = rx.recv().await.expect("toast");
        assert_eq!(toast.level, ToastLevel::Success);
        assert_eq!(toast.message, "Data refreshed successfully");
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        BroadcastNotifier::new(tx).notify(Toast::error("Failed to refresh data"));
    }

    #[test]
    fn test_toast_json_shape() {
        let json = serde_json::to_value(Toast::info("M5.1 - Surigao", "2025-01-15 07:12")).expect("json");
        assert_eq!(json["level"], "info");
        assert_eq!(json["description"], "2025-01-15 07:12");

        let json = serde_json::to_value(Toast::success("ok")).expect("json");
        assert!(json.get("description").is_none());
    }
}
