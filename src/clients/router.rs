use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::clients::host::{ClientQuery, Clients};
use crate::logger::Logger;
use crate::push::{DisplayedNotification, NotificationCenter};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@cooltrack/clients"));

/// Action id of the button that only dismisses a notification.
pub const DISMISS_ACTION: &str = "dismiss";

/// A user interaction with a displayed notification.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationClick {
    pub notification: DisplayedNotification,
    /// The action button pressed, `None` for a click on the notification body.
    pub action: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    Focused { client_id: String },
    Opened { url: String },
    /// The notification named no target and no default was configured.
    NoTarget,
    Failed,
}

/// Routes notification clicks to an open window or a new one.
///
/// Windows are matched by exact URL string equality. `/sensors/5` and `/sensors/5/`
/// are different targets, as are URLs whose query parameters differ only in order.
pub struct ClickRouter {
    clients: Arc<dyn Clients>,
    notifications: Arc<dyn NotificationCenter>,
    default_url: Option<String>,
}

impl ClickRouter {
    pub fn new(
        clients: Arc<dyn Clients>,
        notifications: Arc<dyn NotificationCenter>,
        default_url: Option<String>,
    ) -> Self {
        Self {
            clients,
            notifications,
            default_url,
        }
    }

    /// Target URL for a notification: `data.url`, then `data.click_action`, then the
    /// configured default.
    pub fn target_url(&self, data: &Value) -> Option<String> {
        ["url", "click_action"]
            .iter()
            .find_map(|key| {
                data.get(key)
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty())
            })
            .map(str::to_string)
            .or_else(|| self.default_url.clone())
    }

    pub async fn route(&self, click: NotificationClick) -> ClickOutcome {
        // Close before anything else so repeated taps do not queue more focus attempts.
        if let Err(err) = self.notifications.close(&click.notification).await {
            LOGGER.warn(format!("failed to close notification: {err}"));
        }

        if click.action.as_deref() == Some(DISMISS_ACTION) {
            LOGGER.debug("notification dismissed");
            return ClickOutcome::Dismissed;
        }

        let Some(url) = self.target_url(click.notification.data()) else {
            LOGGER.warn(format!(
                "notification '{}' has no target url",
                click.notification.title
            ));
            return ClickOutcome::NoTarget;
        };

        let windows = match self.clients.match_all(ClientQuery::all_windows()).await {
            Ok(windows) => windows,
            Err(err) => {
                LOGGER.error(format!("failed to enumerate clients: {err}"));
                return ClickOutcome::Failed;
            }
        };

        if let Some(existing) = windows.iter().find(|client| client.url == url) {
            return match self.clients.focus(existing).await {
                Ok(()) => ClickOutcome::Focused {
                    client_id: existing.id.clone(),
                },
                Err(err) => {
                    LOGGER.error(format!("failed to focus {}: {err}", existing.url));
                    ClickOutcome::Failed
                }
            };
        }

        match self.clients.open_window(&url).await {
            Ok(()) => ClickOutcome::Opened { url },
            Err(err) => {
                LOGGER.error(format!("failed to open {url}: {err}"));
                ClickOutcome::Failed
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::clients::host::InMemoryClients;
    use crate::push::{InMemoryNotificationCenter, NotificationOptions};
    use serde_json::json;

    fn click(data: Value, action: Option<&str>) -> NotificationClick {
        NotificationClick {
            notification: DisplayedNotification {
                id: "n-1".into(),
                title: "Alert".into(),
                options: NotificationOptions {
                    data,
                    ..Default::default()
                },
            },
            action: action.map(str::to_string),
        }
    }

    fn router(
        clients: &Arc<InMemoryClients>,
        center: &Arc<InMemoryNotificationCenter>,
        default_url: Option<&str>,
    ) -> ClickRouter {
        ClickRouter::new(
            clients.clone(),
            center.clone(),
            default_url.map(str::to_string),
        )
    }

    #[tokio::test(flavor = "current_thread")]
    async fn focuses_exact_match_without_opening() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());
        clients.add_window("/dashboard", true);
        let target = clients.add_window("/sensors/5", false);

        let outcome = router(&clients, &center, None)
            .route(click(json!({"click_action": "/sensors/5"}), None))
            .await;

        assert_eq!(
            outcome,
            ClickOutcome::Focused {
                client_id: target.id.clone()
            }
        );
        assert_eq!(clients.focused(), vec![target.id]);
        assert!(clients.opened().is_empty());
        assert_eq!(center.closed_ids(), vec!["n-1".to_string()]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn opens_one_window_without_match() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());
        clients.add_window("/sensors/5/", true);

        let outcome = router(&clients, &center, None)
            .route(click(json!({"url": "/sensors/5"}), Some("view")))
            .await;

        assert_eq!(
            outcome,
            ClickOutcome::Opened {
                url: "/sensors/5".into()
            }
        );
        assert_eq!(clients.opened(), vec!["/sensors/5".to_string()]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dismiss_closes_and_stops() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());

        let outcome = router(&clients, &center, Some("/"))
            .route(click(json!({"url": "/alerts"}), Some(DISMISS_ACTION)))
            .await;

        assert_eq!(outcome, ClickOutcome::Dismissed);
        assert_eq!(center.closed_ids().len(), 1);
        assert!(clients.opened().is_empty());
        assert!(clients.focused().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn falls_back_to_default_url() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());

        let with_default = router(&clients, &center, Some("/"))
            .route(click(Value::Null, None))
            .await;
        assert_eq!(with_default, ClickOutcome::Opened { url: "/".into() });

        let without_default = router(&clients, &center, None)
            .route(click(json!({}), None))
            .await;
        assert_eq!(without_default, ClickOutcome::NoTarget);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_url_defers_to_click_action() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());
        let router = router(&clients, &center, Some("/"));

        assert_eq!(
            router.target_url(&json!({"url": "", "click_action": "/sensors/5"})),
            Some("/sensors/5".to_string())
        );
        let outcome = router
            .route(click(json!({"url": "", "click_action": "/sensors/5"}), None))
            .await;
        assert_eq!(
            outcome,
            ClickOutcome::Opened {
                url: "/sensors/5".into()
            }
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn enumeration_failure_is_contained() {
        let clients = Arc::new(InMemoryClients::new());
        let center = Arc::new(InMemoryNotificationCenter::new());
        clients.set_unavailable(true);

        let outcome = router(&clients, &center, None)
            .route(click(json!({"url": "/x"}), None))
            .await;
        assert_eq!(outcome, ClickOutcome::Failed);
        assert!(clients.opened().is_empty());
    }
}
