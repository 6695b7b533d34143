//! Process-wide notification queue ("toasts").
//!
//! Toasts are kept in insertion order and expire after a fixed duration.
//! The layout renders [`Notifier::snapshot`] on every page, and the
//! dismiss button removes one early.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;

/// Identifier of one toast, unique for the life of the process.
pub type ToastId = u64;

/// Visual style of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
}

/// Shared notification channel. Clones share one queue.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    queue: Mutex<VecDeque<Toast>>,
    next_id: AtomicU64,
    duration: Duration,
}

impl NotifierInner {
    fn remove(&self, id: ToastId) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let before = queue.len();
        queue.retain(|toast| toast.id != id);
        queue.len() != before
    }
}

impl Notifier {
    /// Toasts expire `duration` after they are posted.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                queue: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                duration,
            }),
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    /// Post a toast and schedule its removal.
    ///
    /// Outside a Tokio runtime the toast stays until dismissed.
    pub fn notify(&self, message: impl Into<String>, kind: ToastKind) -> ToastId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            message: message.into(),
            kind,
        };
        tracing::debug!(id, kind = %kind, message = %toast.message, "Notification posted");
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(toast);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak: Weak<NotifierInner> = Arc::downgrade(&self.inner);
            let duration = self.inner.duration;
            handle.spawn(async move {
                tokio::time::sleep(duration).await;
                if let Some(inner) = weak.upgrade() {
                    inner.remove(id);
                }
            });
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.notify(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.notify(message, ToastKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.notify(message, ToastKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.notify(message, ToastKind::Info)
    }

    /// Remove a toast early. Returns whether it was still queued.
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.inner.remove(id)
    }

    /// Current toasts, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("duration", &self.inner.duration)
            .field("queued", &self.snapshot().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire_after_duration() {
        let notifier = Notifier::new(Duration::from_millis(5000));
        notifier.success("Customer added successfully");

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(notifier.snapshot().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(notifier.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insertion_order_and_no_dedup() {
        let notifier = Notifier::new(Duration::from_secs(5));
        let first = notifier.error("Search failed");
        let second = notifier.error("Search failed");
        let third = notifier.info("No new orders to export");

        let ids: Vec<_> = notifier.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second, third]);
        assert_eq!(notifier.snapshot()[2].kind, ToastKind::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_is_idempotent() {
        let notifier = Notifier::new(Duration::from_secs(5));
        let id = notifier.warning("Order #12 has been cancelled");
        assert!(notifier.dismiss(id));
        assert!(!notifier.dismiss(id));
        assert!(notifier.snapshot().is_empty());

        // Expiry of an already-dismissed toast is harmless
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(notifier.snapshot().is_empty());
    }

    #[test]
    fn test_without_runtime_toasts_stay_until_dismissed() {
        let notifier = Notifier::new(Duration::from_millis(1));
        let id = notifier.success("saved");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(notifier.snapshot().len(), 1);
        assert!(notifier.dismiss(id));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ToastKind::Warning).unwrap(), "\"warning\"");
    }
}
