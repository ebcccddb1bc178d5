//! Bindings from the worker components to `ServiceWorkerGlobalScope`.
//!
//! The host types hold no JS handles: each call looks the global up again, which keeps them
//! `Send + Sync` as the host traits require.

mod cache;
mod clients;
mod events;
mod network;
mod notifications;

pub use cache::{BrowserCache, BrowserCacheStorage};
pub use clients::BrowserClients;
pub use events::{build_scope, install_listeners, run};
pub use network::BrowserNetwork;
pub use notifications::{BrowserNotifications, BrowserWorkerControl};

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};

/// The running worker's global, `None` outside a service worker (pages, tests in a window).
pub fn worker_global() -> Option<web_sys::ServiceWorkerGlobalScope> {
    js_sys::global().dyn_into().ok()
}

pub(crate) fn format_js_error(operation: &str, err: JsValue) -> String {
    let detail = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    format!("{operation} failed: {detail}")
}

/// Plain JS objects for JSON values; the default serializer would produce `Map`s.
pub(crate) fn json_to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| err.to_string())
}

pub(crate) fn js_to_json(value: JsValue) -> serde_json::Value {
    if value.is_undefined() || value.is_null() {
        return serde_json::Value::Null;
    }
    serde_wasm_bindgen::from_value(value).unwrap_or(serde_json::Value::Null)
}
