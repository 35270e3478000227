//! Transient, auto-dismissing user notifications.
//!
//! A notification is shown, broadcast to subscribers and registered sinks,
//! and removed again once its TTL elapses. Identical notifications can be
//! suppressed within an optional window.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use parking_lot::RwLock;
use recourse_core::ErrorKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;
const DEDUP_CAPACITY: u64 = 1_000;

/// A notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub kind: ErrorKind,
    /// Localized, display-safe text
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Lifecycle events for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Shown(Notification),
    Dismissed { id: u64 },
}

/// Renders notifications, e.g. as toasts.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: &Notification);

    fn dismiss(&self, id: u64);
}

struct Inner {
    active: RwLock<Vec<Notification>>,
    sinks: RwLock<Vec<Arc<dyn NotificationSink>>>,
    events: broadcast::Sender<NotificationEvent>,
    next_id: AtomicU64,
    ttl: Duration,
    recent: Option<Cache<(ErrorKind, String), ()>>,
}

impl Inner {
    fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut active = self.active.write();
            let before = active.len();
            active.retain(|n| n.id != id);
            active.len() != before
        };

        if removed {
            let _ = self.events.send(NotificationEvent::Dismissed { id });
            for sink in self.sinks.read().iter() {
                sink.dismiss(id);
            }
        }
        removed
    }
}

/// Shared notification state. Cloning yields another handle to the same
/// center.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Create a center whose notifications dismiss after `ttl`.
    pub fn new(ttl: Duration, dedup_window: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let recent = dedup_window.map(|window| {
            Cache::builder()
                .max_capacity(DEDUP_CAPACITY)
                .time_to_live(window)
                .build()
        });

        Self {
            inner: Arc::new(Inner {
                active: RwLock::new(Vec::new()),
                sinks: RwLock::new(Vec::new()),
                events,
                next_id: AtomicU64::new(1),
                ttl,
                recent,
            }),
        }
    }

    pub fn add_sink(&self, sink: Arc<dyn NotificationSink>) {
        self.inner.sinks.write().push(sink);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }

    /// Show a notification and schedule its dismissal.
    ///
    /// Returns `None` when an identical notification was shown within the
    /// dedup window. Must be called within a tokio runtime.
    pub async fn notify(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Option<Notification> {
        let message = message.into();

        if let Some(recent) = &self.inner.recent {
            let entry = recent.entry((kind, message.clone())).or_insert(()).await;
            if !entry.is_fresh() {
                tracing::debug!(kind = %kind, "Suppressed duplicate notification");
                return None;
            }
        }

        let notification = Notification {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            message,
            shown_at: Utc::now(),
        };

        self.inner.active.write().push(notification.clone());
        let _ = self.inner.events.send(NotificationEvent::Shown(notification.clone()));
        for sink in self.inner.sinks.read().iter() {
            sink.show(&notification);
        }

        let inner = Arc::clone(&self.inner);
        let id = notification.id;
        tokio::spawn(async move {
            tokio::time::sleep(inner.ttl).await;
            inner.dismiss(id);
        });

        Some(notification)
    }

    /// Dismiss early. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        self.inner.dismiss(id)
    }

    pub fn active(&self) -> Vec<Notification> {
        self.inner.active.read().clone()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<u64>>,
        dismissed: Mutex<Vec<u64>>,
    }

    impl NotificationSink for RecordingSink {
        fn show(&self, notification: &Notification) {
            self.shown.lock().push(notification.id);
        }

        fn dismiss(&self, id: u64) {
            self.dismissed.lock().push(id);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_ttl() {
        let center = NotificationCenter::new(Duration::from_secs(5), None);
        let shown = center.notify(ErrorKind::NetworkError, "Koneksi gagal").await.unwrap();
        assert_eq!(center.active(), vec![shown]);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(center.active().is_empty());
    }

    #[tokio::test]
    async fn test_events_and_sinks() {
        let center = NotificationCenter::default();
        let sink = Arc::new(RecordingSink::default());
        center.add_sink(sink.clone());
        let mut events = center.subscribe();

        let shown = center.notify(ErrorKind::ServerError, "Server error").await.unwrap();
        assert_eq!(events.recv().await.unwrap(), NotificationEvent::Shown(shown.clone()));

        assert!(center.dismiss(shown.id));
        assert!(!center.dismiss(shown.id));
        assert_eq!(
            events.recv().await.unwrap(),
            NotificationEvent::Dismissed { id: shown.id }
        );

        assert_eq!(*sink.shown.lock(), vec![shown.id]);
        assert_eq!(*sink.dismissed.lock(), vec![shown.id]);
    }

    #[tokio::test]
    async fn test_no_dedup_by_default() {
        let center = NotificationCenter::default();
        assert!(center.notify(ErrorKind::TimeoutError, "same").await.is_some());
        assert!(center.notify(ErrorKind::TimeoutError, "same").await.is_some());
        assert_eq!(center.active().len(), 2);
    }

    #[tokio::test]
    async fn test_dedup_window_suppresses_identical() {
        let center = NotificationCenter::new(Duration::from_secs(5), Some(Duration::from_secs(60)));
        assert!(center.notify(ErrorKind::TimeoutError, "same").await.is_some());
        assert!(center.notify(ErrorKind::TimeoutError, "same").await.is_none());
        assert!(center.notify(ErrorKind::TimeoutError, "other").await.is_some());
        assert!(center.notify(ErrorKind::NetworkError, "same").await.is_some());
        assert_eq!(center.active().len(), 3);
    }
}
