//! Page-side helpers: registering the worker, polling for updates and the messages pages
//! post to it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};
use serde_json::Value;

use crate::messaging::FirebaseConfig;
use crate::platform::runtime;
use crate::worker::config::DEFAULT_UPDATE_POLL_INTERVAL_MS;
use crate::worker::error::WorkerResult;
use crate::worker::events::ClientMessage;
use crate::worker::logger::LOGGER;
use crate::worker::scope::LifecycleState;

pub const APP_SHELL_SCRIPT_URL: &str = "/sw.js";
pub const APP_SHELL_SCOPE: &str = "/";
pub const MESSAGING_SCRIPT_URL: &str = "/firebase-messaging-sw.js";
pub const MESSAGING_SCOPE: &str = "/firebase-cloud-messaging-push-scope";

/// How the browser's HTTP cache is consulted when checking the worker script for updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateViaCache {
    Imports,
    All,
    None,
}

impl UpdateViaCache {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateViaCache::Imports => "imports",
            UpdateViaCache::All => "all",
            UpdateViaCache::None => "none",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationOptions {
    pub script_url: String,
    pub scope: String,
    /// `None` leaves the browser default (`imports`).
    pub update_via_cache: Option<UpdateViaCache>,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self::app_shell()
    }
}

impl RegistrationOptions {
    /// The caching worker at the site root, always revalidated against the network.
    pub fn app_shell() -> Self {
        Self {
            script_url: APP_SHELL_SCRIPT_URL.to_string(),
            scope: APP_SHELL_SCOPE.to_string(),
            update_via_cache: Some(UpdateViaCache::None),
        }
    }

    pub fn firebase_messaging() -> Self {
        Self {
            script_url: MESSAGING_SCRIPT_URL.to_string(),
            scope: MESSAGING_SCOPE.to_string(),
            update_via_cache: None,
        }
    }
}

/// The message asking a waiting worker to activate immediately.
pub fn skip_waiting_message() -> Value {
    ClientMessage::SkipWaiting.to_value()
}

/// The message handing the page's Firebase config to the worker.
pub fn firebase_config_message(config: FirebaseConfig) -> Value {
    ClientMessage::FirebaseConfig { config }.to_value()
}

/// Whether a newly installed worker is an update the page should offer: it finished
/// installing while another worker already controls the page.
pub fn update_available(new_worker: LifecycleState, page_is_controlled: bool) -> bool {
    new_worker == LifecycleState::Installed && page_is_controlled
}

/// Asks the browser to re-check the registered worker script.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait UpdateChecker: Send + Sync {
    async fn update(&self) -> WorkerResult<()>;
}

/// Handle on a running update poller.
pub struct UpdatePoller {
    abort: AbortHandle,
}

impl UpdatePoller {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

pub fn default_update_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_UPDATE_POLL_INTERVAL_MS)
}

/// Calls `checker.update()` every `interval` until cancelled. Failed checks are logged and
/// the poller keeps going.
pub fn spawn_update_poller(checker: Arc<dyn UpdateChecker>, interval: Duration) -> UpdatePoller {
    let (task, abort) = abortable(async move {
        loop {
            runtime::sleep(interval).await;
            if let Err(err) = checker.update().await {
                LOGGER.warn(format!("service worker update check failed: {err}"));
            }
        }
    });
    runtime::spawn_detached(async move {
        let _ = task.await;
    });
    UpdatePoller { abort }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod wasm {
    use js_sys::{Array, Reflect};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::{RegistrationOptions, UpdateChecker, UpdateViaCache};
    use crate::platform::browser::{format_js_error, json_to_js};
    use crate::worker::error::{registration_failed, unsupported, WorkerResult};
    use crate::worker::logger::LOGGER;

    fn container() -> WorkerResult<web_sys::ServiceWorkerContainer> {
        let window = web_sys::window()
            .ok_or_else(|| unsupported("Service worker registration requires a Window context"))?;
        let navigator = JsValue::from(window.navigator());
        let container = Reflect::get(&navigator, &JsValue::from_str("serviceWorker"))
            .map_err(|_| unsupported("Service workers are not supported"))?;
        if container.is_undefined() || container.is_null() {
            return Err(unsupported("Service workers are not supported"));
        }
        container
            .dyn_into()
            .map_err(|_| unsupported("Service workers are not supported"))
    }

    fn to_js(value: &serde_json::Value) -> WorkerResult<JsValue> {
        json_to_js(value).map_err(|err| registration_failed(format!("cannot encode message: {err}")))
    }

    /// Registers the worker script described by `options`.
    pub async fn register(
        options: &RegistrationOptions,
    ) -> WorkerResult<web_sys::ServiceWorkerRegistration> {
        let container = container()?;
        let js_options = web_sys::RegistrationOptions::new();
        js_options.set_scope(&options.scope);
        if let Some(mode) = options.update_via_cache {
            js_options.set_update_via_cache(match mode {
                UpdateViaCache::Imports => web_sys::ServiceWorkerUpdateViaCache::Imports,
                UpdateViaCache::All => web_sys::ServiceWorkerUpdateViaCache::All,
                UpdateViaCache::None => web_sys::ServiceWorkerUpdateViaCache::None,
            });
        }

        let registration = JsFuture::from(
            container.register_with_options(&options.script_url, &js_options),
        )
        .await
        .map_err(|err| registration_failed(format_js_error("serviceWorker.register", err)))?;
        LOGGER.info(format!("Service Worker registered: {}", options.script_url));
        registration
            .dyn_into()
            .map_err(|_| registration_failed("Unexpected return value from serviceWorker.register"))
    }

    /// Unregisters every worker of this origin. Returns whether any was removed.
    pub async fn unregister_all() -> WorkerResult<bool> {
        let container = container()?;
        let registrations = JsFuture::from(container.get_registrations())
            .await
            .map_err(|err| registration_failed(format_js_error("getRegistrations", err)))?;
        let mut removed = false;
        for registration in Array::from(&registrations).iter() {
            let registration: web_sys::ServiceWorkerRegistration = registration
                .dyn_into()
                .map_err(|_| registration_failed("Unexpected registration value"))?;
            let promise = registration
                .unregister()
                .map_err(|err| registration_failed(format_js_error("unregister", err)))?;
            let result = JsFuture::from(promise)
                .await
                .map_err(|err| registration_failed(format_js_error("unregister", err)))?;
            removed |= result.as_bool().unwrap_or(false);
        }
        Ok(removed)
    }

    /// Posts `message` to the waiting worker of the registration at `scope`, if any.
    pub async fn post_to_waiting(scope: &str, message: &serde_json::Value) -> WorkerResult<bool> {
        let container = container()?;
        let registration = JsFuture::from(container.get_registration_with_document_url(scope))
            .await
            .map_err(|err| registration_failed(format_js_error("getRegistration", err)))?;
        let Ok(registration) = registration.dyn_into::<web_sys::ServiceWorkerRegistration>()
        else {
            return Ok(false);
        };
        let Some(waiting) = registration.waiting() else {
            return Ok(false);
        };
        waiting
            .post_message(&to_js(message)?)
            .map_err(|err| registration_failed(format_js_error("postMessage", err)))?;
        Ok(true)
    }

    /// Posts `message` to the worker controlling this page, if any.
    pub fn post_to_controller(message: &serde_json::Value) -> WorkerResult<bool> {
        let Some(controller) = container()?.controller() else {
            return Ok(false);
        };
        controller
            .post_message(&to_js(message)?)
            .map_err(|err| registration_failed(format_js_error("postMessage", err)))?;
        Ok(true)
    }

    /// Update checker that looks the registration up by scope on every check.
    #[derive(Clone, Debug)]
    pub struct RegistrationUpdater {
        scope: String,
    }

    impl RegistrationUpdater {
        pub fn new(scope: impl Into<String>) -> Self {
            Self {
                scope: scope.into(),
            }
        }
    }

    #[async_trait::async_trait(?Send)]
    impl UpdateChecker for RegistrationUpdater {
        async fn update(&self) -> WorkerResult<()> {
            let container = container()?;
            let registration =
                JsFuture::from(container.get_registration_with_document_url(&self.scope))
                    .await
                    .map_err(|err| registration_failed(format_js_error("getRegistration", err)))?;
            let registration: web_sys::ServiceWorkerRegistration = registration
                .dyn_into()
                .map_err(|_| registration_failed(format!("no registration for {}", self.scope)))?;
            let promise = registration
                .update()
                .map_err(|err| registration_failed(format_js_error("update", err)))?;
            JsFuture::from(promise)
                .await
                .map_err(|err| registration_failed(format_js_error("update", err)))?;
            Ok(())
        }
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use wasm::{post_to_controller, post_to_waiting, register, unregister_all, RegistrationUpdater};
