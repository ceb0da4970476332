//! Notification sink abstraction.
//!
//! Surfaces transient success/failure messages to the user.
//! Notifications are fire-and-forget: delivery is never awaited on for
//! correctness and a sink cannot fail the calling workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Visual kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Neutral or success message.
    Info,
    /// Message about a destructive or failed operation.
    Destructive,
}

/// Trait for the notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Surface a transient message to the user.
    async fn notify(&self, kind: NotificationKind, title: &str, message: &str);
}

/// Wrapper for boxed `Notifier` trait object.
pub type NotifierService = Arc<dyn Notifier>;

/// A no-op implementation of `Notifier` for headless use.
#[derive(Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _kind: NotificationKind, _title: &str, _message: &str) {}
}

/// A `Notifier` that records messages to the tracing log.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        match kind {
            NotificationKind::Info => {
                tracing::info!(title = title, message = message, "notification");
            }
            NotificationKind::Destructive => {
                tracing::warn!(title = title, message = message, "notification");
            }
        }
    }
}
