use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::push::Notification;

/// Web app configuration served by the backend and posted by pages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
    #[serde(
        default,
        rename = "databaseURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub database_url: Option<String>,
}

impl FirebaseConfig {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.auth_domain.is_none()
            && self.project_id.is_none()
            && self.storage_bucket.is_none()
            && self.messaging_sender_id.is_none()
            && self.app_id.is_none()
            && self.measurement_id.is_none()
            && self.database_url.is_none()
    }
}

/// Body of the config endpoint.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ConfigEnvelope {
    pub config: Option<FirebaseConfig>,
}

/// Payload displayed to the user when a notification is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

/// Additional FCM options for a payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcmOptions {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub analytics_label: Option<String>,
}

/// Message data delivered by Firebase Cloud Messaging.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub notification: Option<NotificationPayload>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default, alias = "fcm_options")]
    pub fcm_options: Option<FcmOptions>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default, alias = "collapse_key")]
    pub collapse_key: Option<String>,
    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,
}

/// Maps a message received while no page is focused to the notification to show.
pub type BackgroundMessageHandler =
    Arc<dyn Fn(&MessagePayload) -> Option<Notification> + Send + Sync + 'static>;

pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;

/// The global scope a messaging client runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionContext {
    #[default]
    ServiceWorker,
    Window,
}
