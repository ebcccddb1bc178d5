//! Decoding of push service payloads into notifications.
//!
//! Two payload shapes reach the worker. Firebase Cloud Messaging nests the visible fields
//! under `notification` and keeps routing data under `data`; the app's own push server
//! sends flat `{title, body, url, tag}` objects. Nested fields win over flat ones, and
//! both fall back to the configured [`NotificationDefaults`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::platform::runtime;
use crate::push::error::{malformed_payload, PushResult};
use crate::push::types::{Notification, NotificationAction, NotificationDefaults, NotificationOptions};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PushNotificationFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub actions: Option<Vec<NotificationAction>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub click_action: Option<String>,
}

/// A decoded push message. Lives only for the handling of one push event.
#[derive(Clone, Debug, PartialEq)]
pub struct PushPayload {
    pub notification: Option<PushNotificationFields>,
    pub flat: PushNotificationFields,
    pub data: Option<Value>,
    /// The payload as received, for consumers with their own schema.
    pub raw: Value,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(default)]
    notification: Option<PushNotificationFields>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(flatten)]
    flat: PushNotificationFields,
}

impl PushPayload {
    pub fn from_slice(bytes: &[u8]) -> PushResult<Self> {
        let raw: Value = serde_json::from_slice(bytes)
            .map_err(|err| malformed_payload(format!("push payload is not JSON: {err}")))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> PushResult<Self> {
        if !raw.is_object() {
            return Err(malformed_payload("push payload must be a JSON object"));
        }
        let wire: WirePayload = serde_json::from_value(raw.clone())
            .map_err(|err| malformed_payload(format!("unexpected push payload shape: {err}")))?;
        Ok(Self {
            notification: wire.notification,
            flat: wire.flat,
            data: wire.data,
            raw,
        })
    }

    fn pick<T: Clone>(&self, field: impl Fn(&PushNotificationFields) -> &Option<T>) -> Option<T> {
        self.notification
            .as_ref()
            .and_then(|nested| field(nested).clone())
            .or_else(|| field(&self.flat).clone())
    }

    /// Title carried by the payload itself, ignoring defaults.
    pub fn title(&self) -> Option<String> {
        self.pick(|fields| &fields.title)
    }

    /// Builds the notification to show, or `None` when neither the payload nor the
    /// defaults provide a title (a data-only message).
    pub fn to_notification(&self, defaults: &NotificationDefaults) -> Option<Notification> {
        let title = self.title().or_else(|| defaults.title.clone())?;
        Some(Notification::new(title, self.to_options(defaults)))
    }

    pub fn to_options(&self, defaults: &NotificationDefaults) -> NotificationOptions {
        NotificationOptions {
            body: self.pick(|f| &f.body).or_else(|| defaults.body.clone()),
            icon: self.pick(|f| &f.icon).or_else(|| defaults.icon.clone()),
            badge: self.pick(|f| &f.badge).or_else(|| defaults.badge.clone()),
            image: self.pick(|f| &f.image),
            tag: self.pick(|f| &f.tag).or_else(|| defaults.tag.clone()),
            data: self.routing_data(defaults),
            actions: self
                .pick(|f| &f.actions)
                .unwrap_or_else(|| defaults.actions.clone()),
            vibrate: defaults.vibrate.clone(),
            require_interaction: defaults.require_interaction,
            silent: false,
        }
    }

    /// The `data` object handed to the click router. Non-object data passes through
    /// untouched.
    fn routing_data(&self, defaults: &NotificationDefaults) -> Value {
        let mut data = match &self.data {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => return other.clone(),
            None => Map::new(),
        };

        if !data.contains_key("url") {
            if let Some(url) = self.flat.url.clone() {
                data.insert("url".into(), Value::String(url));
            }
        }
        if !data.contains_key("click_action") {
            if let Some(action) = self.pick(|f| &f.click_action) {
                data.insert("click_action".into(), Value::String(action));
            }
        }
        if !data.contains_key("url") && !data.contains_key("click_action") {
            if let Some(url) = defaults.default_url.clone() {
                data.insert("url".into(), Value::String(url));
            }
        }
        if defaults.stamp_timestamp {
            data.insert("timestamp".into(), Value::from(runtime::now_millis()));
        }

        if data.is_empty() && self.data.is_none() {
            Value::Null
        } else {
            Value::Object(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_fields_take_precedence() {
        let payload = PushPayload::from_value(json!({
            "title": "flat",
            "notification": {"title": "Alert", "body": "Temp high", "tag": "sensor-5"},
            "data": {"click_action": "/sensors/5"}
        }))
        .unwrap();

        let notification = payload
            .to_notification(&NotificationDefaults::default())
            .unwrap();
        assert_eq!(notification.title, "Alert");
        assert_eq!(notification.options.body.as_deref(), Some("Temp high"));
        assert_eq!(notification.options.tag.as_deref(), Some("sensor-5"));
        assert_eq!(notification.options.data, json!({"click_action": "/sensors/5"}));
    }

    #[test]
    fn flat_payload_uses_app_shell_defaults() {
        let payload = PushPayload::from_value(json!({"url": "/alerts"})).unwrap();
        let notification = payload
            .to_notification(&NotificationDefaults::app_shell())
            .unwrap();

        assert_eq!(notification.title, "Cool Track");
        assert_eq!(
            notification.options.body.as_deref(),
            Some("New notification from Cool Track")
        );
        assert_eq!(notification.options.data["url"], json!("/alerts"));
        assert!(notification.options.data["timestamp"].is_i64());
        assert_eq!(notification.options.actions.len(), 2);
        assert!(notification.options.require_interaction);
    }

    #[test]
    fn default_url_fills_missing_target() {
        let payload = PushPayload::from_value(json!({"title": "Hi"})).unwrap();
        let options = payload.to_options(&NotificationDefaults::app_shell());
        assert_eq!(options.data["url"], json!("/"));
    }

    #[test]
    fn data_only_message_has_no_notification() {
        let payload = PushPayload::from_value(json!({"data": {"kind": "sync"}})).unwrap();
        assert!(payload
            .to_notification(&NotificationDefaults::default())
            .is_none());
    }

    #[test]
    fn non_object_data_is_passed_through() {
        let payload =
            PushPayload::from_value(json!({"notification": {"title": "t"}, "data": "opaque"}))
                .unwrap();
        let options = payload.to_options(&NotificationDefaults::default());
        assert_eq!(options.data, json!("opaque"));
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert_eq!(
            PushPayload::from_slice(b"not json").unwrap_err().code_str(),
            "push/malformed-payload"
        );
        assert!(PushPayload::from_value(json!([1, 2])).is_err());
    }
}
