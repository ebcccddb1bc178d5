use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::push::error::PushResult;
use crate::push::types::{DisplayedNotification, Notification};

/// Access to the platform notification tray.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait NotificationCenter: Send + Sync {
    /// Shows the notification. Resolves once the platform has displayed it.
    async fn show(&self, notification: Notification) -> PushResult<()>;

    async fn close(&self, notification: &DisplayedNotification) -> PushResult<()>;
}

/// Notification tray that records what would have been shown.
#[derive(Default)]
pub struct InMemoryNotificationCenter {
    next_id: AtomicUsize,
    shown: Mutex<Vec<DisplayedNotification>>,
    closed: Mutex<Vec<String>>,
}

impl InMemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification shown so far, in display order.
    pub fn shown(&self) -> Vec<DisplayedNotification> {
        self.shown
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Notifications shown and not yet closed.
    pub fn visible(&self) -> Vec<DisplayedNotification> {
        let closed = self.closed_ids();
        self.shown()
            .into_iter()
            .filter(|notification| !closed.contains(&notification.id))
            .collect()
    }

    pub fn closed_ids(&self) -> Vec<String> {
        self.closed
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
impl NotificationCenter for InMemoryNotificationCenter {
    async fn show(&self, notification: Notification) -> PushResult<()> {
        let id = format!("notification-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut shown = self.shown.lock().unwrap_or_else(|poison| poison.into_inner());
        // A tag replaces the notification currently shown under the same tag.
        if let Some(tag) = notification.options.tag.as_deref() {
            let replaced: Vec<String> = shown
                .iter()
                .filter(|existing| existing.options.tag.as_deref() == Some(tag))
                .map(|existing| existing.id.clone())
                .collect();
            self.closed
                .lock()
                .unwrap_or_else(|poison| poison.into_inner())
                .extend(replaced);
        }
        shown.push(DisplayedNotification {
            id,
            title: notification.title,
            options: notification.options,
        });
        Ok(())
    }

    async fn close(&self, notification: &DisplayedNotification) -> PushResult<()> {
        let mut closed = self.closed.lock().unwrap_or_else(|poison| poison.into_inner());
        if !closed.contains(&notification.id) {
            closed.push(notification.id.clone());
        }
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::push::types::NotificationOptions;

    fn tagged(title: &str, tag: &str) -> Notification {
        Notification::new(
            title,
            NotificationOptions {
                tag: Some(tag.into()),
                ..Default::default()
            },
        )
    }

    #[tokio::test(flavor = "current_thread")]
    async fn same_tag_replaces_visible_notification() {
        let center = InMemoryNotificationCenter::new();
        center.show(tagged("first", "general")).await.unwrap();
        center.show(tagged("second", "general")).await.unwrap();
        center.show(tagged("other", "sensor")).await.unwrap();

        let titles: Vec<_> = center.visible().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["second", "other"]);
        assert_eq!(center.shown().len(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn close_is_idempotent() {
        let center = InMemoryNotificationCenter::new();
        center.show(tagged("only", "t")).await.unwrap();
        let shown = center.shown().remove(0);
        center.close(&shown).await.unwrap();
        center.close(&shown).await.unwrap();
        assert_eq!(center.closed_ids(), vec![shown.id]);
        assert!(center.visible().is_empty());
    }
}
