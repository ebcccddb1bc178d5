use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Button rendered on a notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    pub fn new(action: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Options passed to the platform's `showNotification`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vibrate: Vec<u32>,
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default)]
    pub silent: bool,
}

/// A notification ready to be shown.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    pub fn new(title: impl Into<String>, options: NotificationOptions) -> Self {
        Self {
            title: title.into(),
            options,
        }
    }
}

/// A notification the platform is currently showing, as reported back on interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayedNotification {
    /// Host-assigned identity used to close this exact notification.
    pub id: String,
    pub title: String,
    pub options: NotificationOptions,
}

impl DisplayedNotification {
    pub fn data(&self) -> &Value {
        &self.options.data
    }
}

/// Values applied when a push payload leaves a field unset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationDefaults {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub actions: Vec<NotificationAction>,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    /// URL opened on click when the payload names none.
    pub default_url: Option<String>,
    /// Adds the receive time (ms since epoch) to the notification data as `timestamp`.
    pub stamp_timestamp: bool,
}

impl NotificationDefaults {
    /// Defaults of the installable app shell worker.
    pub fn app_shell() -> Self {
        Self {
            title: Some("Cool Track".into()),
            body: Some("New notification from Cool Track".into()),
            icon: Some("/icons/icon-192x192.png".into()),
            badge: Some("/icons/icon-72x72.png".into()),
            tag: Some("general".into()),
            actions: vec![
                NotificationAction::new("view", "View").with_icon("/icons/icon-96x96.png"),
                NotificationAction::new("dismiss", "Dismiss"),
            ],
            vibrate: vec![100, 50, 100],
            require_interaction: true,
            default_url: Some("/".into()),
            stamp_timestamp: true,
        }
    }
}
