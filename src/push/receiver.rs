use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::logger::Logger;
use crate::push::center::NotificationCenter;
use crate::push::payload::PushPayload;
use crate::push::types::{Notification, NotificationDefaults};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@cooltrack/push"));

/// Receives payloads that carry no title of their own (data-only messages).
pub trait DataMessageRoute: Send + Sync {
    /// Returns the notification to show for the raw payload, if any.
    fn route(&self, raw: &Value) -> Option<Notification>;
}

/// What a push event resulted in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    NoPayload,
    Malformed,
    Displayed { title: String },
    /// A data-only message that the route turned into a notification.
    Routed { title: String },
    /// A data-only message with nowhere to go.
    Dropped,
    DisplayFailed,
}

/// Turns push events into platform notifications.
pub struct PushReceiver {
    center: Arc<dyn NotificationCenter>,
    defaults: NotificationDefaults,
}

impl PushReceiver {
    pub fn new(center: Arc<dyn NotificationCenter>, defaults: NotificationDefaults) -> Self {
        Self { center, defaults }
    }

    pub fn defaults(&self) -> &NotificationDefaults {
        &self.defaults
    }

    /// Handles one push event. Never fails: decoding and display errors are logged and
    /// reported through the outcome so a bad payload cannot take the worker down.
    ///
    /// The returned future completes only after the notification is on screen; hosts must
    /// keep the event alive until then.
    pub async fn receive(
        &self,
        data: Option<&[u8]>,
        route: Option<&dyn DataMessageRoute>,
    ) -> PushOutcome {
        let Some(bytes) = data else {
            LOGGER.debug("push event carried no payload");
            return PushOutcome::NoPayload;
        };

        let payload = match PushPayload::from_slice(bytes) {
            Ok(payload) => payload,
            Err(err) => {
                LOGGER.error(format!("Error handling push event: {err}"));
                return PushOutcome::Malformed;
            }
        };

        match payload.to_notification(&self.defaults) {
            Some(notification) => {
                let title = notification.title.clone();
                if self.display(notification).await {
                    PushOutcome::Displayed { title }
                } else {
                    PushOutcome::DisplayFailed
                }
            }
            None => match route.and_then(|route| route.route(&payload.raw)) {
                Some(notification) => {
                    let title = notification.title.clone();
                    if self.display(notification).await {
                        PushOutcome::Routed { title }
                    } else {
                        PushOutcome::DisplayFailed
                    }
                }
                None => {
                    LOGGER.warn("dropping data-only push message: no background handler");
                    PushOutcome::Dropped
                }
            },
        }
    }

    async fn display(&self, notification: Notification) -> bool {
        let title = notification.title.clone();
        match self.center.show(notification).await {
            Ok(()) => {
                LOGGER.debug(format!("notification '{title}' shown"));
                true
            }
            Err(err) => {
                LOGGER.error(format!("failed to show notification '{title}': {err}"));
                false
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::push::center::InMemoryNotificationCenter;
    use crate::push::error::{display_failed, PushResult};
    use crate::push::types::{DisplayedNotification, NotificationOptions};
    use serde_json::json;

    struct BrokenCenter;

    #[async_trait::async_trait]
    impl NotificationCenter for BrokenCenter {
        async fn show(&self, _notification: Notification) -> PushResult<()> {
            Err(display_failed("permission revoked"))
        }

        async fn close(&self, _notification: &DisplayedNotification) -> PushResult<()> {
            Ok(())
        }
    }

    struct EchoRoute;

    impl DataMessageRoute for EchoRoute {
        fn route(&self, raw: &Value) -> Option<Notification> {
            let kind = raw["data"]["kind"].as_str()?;
            Some(Notification::new(kind, NotificationOptions::default()))
        }
    }

    fn receiver(center: Arc<dyn NotificationCenter>) -> PushReceiver {
        PushReceiver::new(center, NotificationDefaults::default())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_payload_is_a_no_op() {
        let center = Arc::new(InMemoryNotificationCenter::new());
        let outcome = receiver(center.clone()).receive(None, None).await;
        assert_eq!(outcome, PushOutcome::NoPayload);
        assert!(center.shown().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_payload_is_suppressed() {
        let center = Arc::new(InMemoryNotificationCenter::new());
        let outcome = receiver(center.clone())
            .receive(Some(b"{not json".as_slice()), None)
            .await;
        assert_eq!(outcome, PushOutcome::Malformed);
        assert!(center.shown().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn shows_exactly_one_notification() {
        let center = Arc::new(InMemoryNotificationCenter::new());
        let body = json!({
            "notification": {"title": "Alert", "body": "Temp high"},
            "data": {"click_action": "/sensors/5"}
        })
        .to_string();

        let outcome = receiver(center.clone())
            .receive(Some(body.as_bytes()), None)
            .await;

        assert_eq!(
            outcome,
            PushOutcome::Displayed {
                title: "Alert".into()
            }
        );
        let shown = center.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Alert");
        assert_eq!(shown[0].data()["click_action"], json!("/sensors/5"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn data_only_messages_use_the_route() {
        let center = Arc::new(InMemoryNotificationCenter::new());
        let body = json!({"data": {"kind": "sync"}}).to_string();
        let push = receiver(center.clone());

        let routed = push.receive(Some(body.as_bytes()), Some(&EchoRoute)).await;
        assert_eq!(routed, PushOutcome::Routed { title: "sync".into() });

        let dropped = push.receive(Some(body.as_bytes()), None).await;
        assert_eq!(dropped, PushOutcome::Dropped);
        assert_eq!(center.shown().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn display_failures_are_reported_not_raised() {
        let body = json!({"title": "x"}).to_string();
        let outcome = receiver(Arc::new(BrokenCenter))
            .receive(Some(body.as_bytes()), None)
            .await;
        assert_eq!(outcome, PushOutcome::DisplayFailed);
    }
}
