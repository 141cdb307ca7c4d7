//! Toast-style notifications.
//!
//! DESIGN
//! ======
//! The gateway and controllers push notifications through the [`Notifier`]
//! trait; front-ends decide how to show them. [`NotificationCenter`] keeps
//! them in memory until drained, which is what both the CLI and the tests
//! use.

#[cfg(test)]
#[path = "notify_test.rs"]
mod notify_test;

use std::sync::Mutex;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub variant: Variant,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { variant: Variant::Default, title: title.into(), description: description.into() }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { variant: Variant::Destructive, title: title.into(), description: description.into() }
    }

    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// In-memory notification queue.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, destructive = notification.is_destructive(), "notification");
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}
