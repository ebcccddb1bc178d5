use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::platform::browser::{format_js_error, js_to_json, json_to_js, worker_global};
use crate::push::error::{display_failed, permission_denied, PushResult};
use crate::push::{DisplayedNotification, Notification, NotificationCenter, NotificationOptions};
use crate::worker::error::{internal_error, WorkerResult};
use crate::worker::WorkerControl;

static NEXT_NOTIFICATION_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    // Notifications handed to the worker by click/close events, so `close` can reach them.
    static DELIVERED: RefCell<HashMap<String, web_sys::Notification>> = RefCell::new(HashMap::new());
}

/// Registers a notification delivered by an event and returns the worker's view of it.
pub(crate) fn track(notification: web_sys::Notification) -> DisplayedNotification {
    let id = format!(
        "notification-{}",
        NEXT_NOTIFICATION_ID.fetch_add(1, Ordering::SeqCst)
    );
    let displayed = describe(&id, &notification);
    DELIVERED.with(|delivered| delivered.borrow_mut().insert(id, notification));
    displayed
}

pub(crate) fn forget(notification: &DisplayedNotification) {
    DELIVERED.with(|delivered| delivered.borrow_mut().remove(&notification.id));
}

fn describe(id: &str, notification: &web_sys::Notification) -> DisplayedNotification {
    let non_empty = |value: String| (!value.is_empty()).then_some(value);
    DisplayedNotification {
        id: id.to_string(),
        title: notification.title(),
        options: NotificationOptions {
            body: non_empty(notification.body()),
            icon: non_empty(notification.icon()),
            tag: non_empty(notification.tag()),
            data: js_to_json(notification.data()),
            ..Default::default()
        },
    }
}

/// Notifications shown through `self.registration`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNotifications;

impl BrowserNotifications {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl NotificationCenter for BrowserNotifications {
    async fn show(&self, notification: Notification) -> PushResult<()> {
        let global = worker_global().ok_or_else(|| display_failed("not running in a service worker"))?;
        if web_sys::Notification::permission() == web_sys::NotificationPermission::Denied {
            return Err(permission_denied("notification permission denied"));
        }
        let options: web_sys::NotificationOptions = json_to_js(&notification.options)
            .map_err(|err| display_failed(format!("cannot encode notification options: {err}")))?
            .unchecked_into();
        let promise = global
            .registration()
            .show_notification_with_options(&notification.title, &options)
            .map_err(|err| display_failed(format_js_error("showNotification", err)))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| display_failed(format_js_error("showNotification", err)))?;
        Ok(())
    }

    async fn close(&self, notification: &DisplayedNotification) -> PushResult<()> {
        let delivered = DELIVERED.with(|delivered| delivered.borrow_mut().remove(&notification.id));
        if let Some(delivered) = delivered {
            delivered.close();
        }
        Ok(())
    }
}

/// `self.skipWaiting()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserWorkerControl;

impl BrowserWorkerControl {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl WorkerControl for BrowserWorkerControl {
    async fn skip_waiting(&self) -> WorkerResult<()> {
        let global = worker_global().ok_or_else(|| internal_error("not running in a service worker"))?;
        let promise = global
            .skip_waiting()
            .map_err(|err| internal_error(format_js_error("skipWaiting", err)))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| internal_error(format_js_error("skipWaiting", err)))?;
        Ok(())
    }
}
