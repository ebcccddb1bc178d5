use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::messaging::app::FirebaseApp;
use crate::messaging::error::{
    available_in_service_worker, malformed_payload, missing_app_config_values, MessagingResult,
};
use crate::messaging::logger::LOGGER;
use crate::messaging::types::{
    BackgroundMessageHandler, ExecutionContext, MessagePayload, Unsubscribe,
};
use crate::push::{DataMessageRoute, Notification, NotificationDefaults, NotificationOptions};

static NEXT_ON_BACKGROUND_ID: AtomicUsize = AtomicUsize::new(1);

/// Builds the messaging client for a freshly initialized app.
pub type MessagingFactory =
    Arc<dyn Fn(&FirebaseApp) -> MessagingResult<Messaging> + Send + Sync + 'static>;

/// Factory used by workers: a service-worker scoped client.
pub fn service_worker_factory() -> MessagingFactory {
    Arc::new(|app: &FirebaseApp| Messaging::new(app.clone(), ExecutionContext::ServiceWorker))
}

#[derive(Clone, Debug)]
pub struct Messaging {
    inner: Arc<MessagingInner>,
}

#[derive(Debug)]
struct MessagingInner {
    app: FirebaseApp,
    context: ExecutionContext,
    on_background_message_handler: Mutex<Option<HandlerEntry>>,
}

#[derive(Clone)]
struct HandlerEntry {
    id: usize,
    handler: BackgroundMessageHandler,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .finish()
    }
}

impl Messaging {
    /// Creates a client for `app`. The app options must carry the values messaging needs
    /// to address the project.
    pub fn new(app: FirebaseApp, context: ExecutionContext) -> MessagingResult<Self> {
        let options = app.options();
        let required = [
            ("projectId", &options.project_id),
            ("apiKey", &options.api_key),
            ("appId", &options.app_id),
            ("messagingSenderId", &options.messaging_sender_id),
        ];
        if let Some((field, _)) = required
            .iter()
            .find(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        {
            return Err(missing_app_config_values(field));
        }

        Ok(Self {
            inner: Arc::new(MessagingInner {
                app,
                context,
                on_background_message_handler: Mutex::new(None),
            }),
        })
    }

    pub fn app(&self) -> &FirebaseApp {
        &self.inner.app
    }

    pub fn context(&self) -> ExecutionContext {
        self.inner.context
    }

    /// Whether this client can receive background messages at all.
    pub fn supports_background_messages(&self) -> bool {
        self.inner.context == ExecutionContext::ServiceWorker
    }

    /// Registers the handler invoked for messages that arrive while no page is focused.
    ///
    /// Replaces any previous handler. The returned closure removes the handler unless it has
    /// been replaced in the meantime.
    pub fn on_background_message(
        &self,
        handler: BackgroundMessageHandler,
    ) -> MessagingResult<Unsubscribe> {
        if !self.supports_background_messages() {
            return Err(available_in_service_worker(
                "on_background_message must be called in a Service Worker context",
            ));
        }

        let id = NEXT_ON_BACKGROUND_ID.fetch_add(1, Ordering::SeqCst);
        *self
            .inner
            .on_background_message_handler
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = Some(HandlerEntry { id, handler });

        let inner = Arc::clone(&self.inner);
        Ok(Box::new(move || {
            let mut guard = inner
                .on_background_message_handler
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            if guard.as_ref().map(|entry| entry.id) == Some(id) {
                *guard = None;
            }
        }))
    }

    pub fn has_background_handler(&self) -> bool {
        self.inner
            .on_background_message_handler
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .is_some()
    }

    /// Runs the registered background handler. `None` when no handler is registered or the
    /// handler chose not to notify.
    pub fn dispatch_background_message(&self, payload: &MessagePayload) -> Option<Notification> {
        let handler = self
            .inner
            .on_background_message_handler
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .as_ref()
            .map(|entry| entry.handler.clone())?;
        LOGGER.debug(format!(
            "Background message received: {:?}",
            payload.message_id
        ));
        handler(payload)
    }
}

impl DataMessageRoute for Messaging {
    fn route(&self, raw: &Value) -> Option<Notification> {
        match parse_message(raw) {
            Ok(payload) => self.dispatch_background_message(&payload),
            Err(err) => {
                LOGGER.warn(format!("ignoring background message: {err}"));
                None
            }
        }
    }
}

fn parse_message(raw: &Value) -> MessagingResult<MessagePayload> {
    serde_json::from_value(raw.clone()).map_err(|err| malformed_payload(err.to_string()))
}

/// Handler showing the notification block of a message, with `defaults` filling gaps.
///
/// Messages with no title anywhere produce no notification.
pub fn default_background_handler(defaults: NotificationDefaults) -> BackgroundMessageHandler {
    Arc::new(move |payload: &MessagePayload| {
        let notification = payload.notification.clone().unwrap_or_default();
        let title = notification.title.or_else(|| defaults.title.clone())?;
        let data = payload
            .data
            .clone()
            .map(Value::Object)
            .unwrap_or(Value::Null);
        Some(Notification::new(
            title,
            NotificationOptions {
                body: notification.body.or_else(|| defaults.body.clone()),
                icon: notification.icon.or_else(|| defaults.icon.clone()),
                badge: notification.badge.or_else(|| defaults.badge.clone()),
                image: notification.image,
                data,
                ..Default::default()
            },
        ))
    })
}
