use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::clients::NotificationClick;
use crate::fetch::FetchOutcome;
use crate::platform::browser::network::{from_web_request, to_web_response};
use crate::platform::browser::notifications::{forget, track};
use crate::platform::browser::{
    format_js_error, js_to_json, worker_global, BrowserCacheStorage, BrowserClients,
    BrowserNetwork, BrowserNotifications, BrowserWorkerControl,
};
use crate::worker::error::{internal_error, WorkerResult};
use crate::worker::logger::LOGGER;
use crate::worker::{ServiceWorkerScope, WorkerConfig};

/// Builds a scope wired to the browser hosts.
pub fn build_scope(config: WorkerConfig) -> WorkerResult<ServiceWorkerScope> {
    ServiceWorkerScope::builder(config)
        .caches(Arc::new(BrowserCacheStorage::new()))
        .network(Arc::new(BrowserNetwork::new()))
        .notifications(Arc::new(BrowserNotifications::new()))
        .clients(Arc::new(BrowserClients::new()))
        .control(Arc::new(BrowserWorkerControl::new()))
        .build()
}

/// Entry point of a worker script: builds the scope, starts it and listens for events.
pub fn run(config: WorkerConfig) -> WorkerResult<()> {
    let scope = Rc::new(build_scope(config)?);
    scope.start();
    install_listeners(scope)
}

/// Keeps the event alive until `work` settles.
fn wait_until<F>(event: &web_sys::ExtendableEvent, work: F)
where
    F: Future<Output = Result<JsValue, JsValue>> + 'static,
{
    if let Err(err) = event.wait_until(&future_to_promise(work)) {
        LOGGER.warn(format_js_error("waitUntil", err));
    }
}

fn listen<E, H>(global: &web_sys::ServiceWorkerGlobalScope, name: &str, handler: H) -> WorkerResult<()>
where
    E: FromWasmAbi + 'static,
    H: FnMut(E) + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    global
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(|err| internal_error(format_js_error("addEventListener", err)))?;
    // Listeners live as long as the worker.
    closure.forget();
    Ok(())
}

/// Registers `install`, `activate`, `fetch`, `push`, `notificationclick`,
/// `notificationclose` and `message` listeners on the worker global.
pub fn install_listeners(scope: Rc<ServiceWorkerScope>) -> WorkerResult<()> {
    let global = worker_global().ok_or_else(|| internal_error("not running in a service worker"))?;

    let install_scope = Rc::clone(&scope);
    listen(&global, "install", move |event: web_sys::ExtendableEvent| {
        let scope = Rc::clone(&install_scope);
        wait_until(&event, async move {
            scope
                .install()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|err| JsValue::from_str(&err.to_string()))
        });
    })?;

    let activate_scope = Rc::clone(&scope);
    listen(&global, "activate", move |event: web_sys::ExtendableEvent| {
        let scope = Rc::clone(&activate_scope);
        wait_until(&event, async move {
            scope
                .activate()
                .await
                .map(|_| JsValue::UNDEFINED)
                .map_err(|err| JsValue::from_str(&err.to_string()))
        });
    })?;

    let fetch_scope = Rc::clone(&scope);
    listen(&global, "fetch", move |event: web_sys::FetchEvent| {
        let web_request = event.request();
        let request = from_web_request(&web_request);
        if !fetch_scope.intercepts(&request) {
            return;
        }
        let scope = Rc::clone(&fetch_scope);
        let promise = future_to_promise(async move {
            match scope.fetch(request).await {
                FetchOutcome::Respond(response) => to_web_response(&response).map(JsValue::from),
                // State changed after the listener decided to respond.
                FetchOutcome::Passthrough => match worker_global() {
                    Some(global) => {
                        JsFuture::from(global.fetch_with_request(&web_request)).await
                    }
                    None => Err(JsValue::from_str("not running in a service worker")),
                },
            }
        });
        if let Err(err) = event.respond_with(&promise) {
            LOGGER.warn(format_js_error("respondWith", err));
        }
    })?;

    let push_scope = Rc::clone(&scope);
    listen(&global, "push", move |event: web_sys::PushEvent| {
        let scope = Rc::clone(&push_scope);
        let data = event.data().map(|data| data.text().into_bytes());
        wait_until(&event, async move {
            scope.push(data.as_deref()).await;
            Ok(JsValue::UNDEFINED)
        });
    })?;

    let click_scope = Rc::clone(&scope);
    listen(
        &global,
        "notificationclick",
        move |event: web_sys::NotificationEvent| {
            let scope = Rc::clone(&click_scope);
            let action = event.action();
            let click = NotificationClick {
                notification: track(event.notification()),
                action: (!action.is_empty()).then_some(action),
            };
            wait_until(&event, async move {
                scope.notification_click(click).await;
                Ok(JsValue::UNDEFINED)
            });
        },
    )?;

    let close_scope = Rc::clone(&scope);
    listen(
        &global,
        "notificationclose",
        move |event: web_sys::NotificationEvent| {
            let displayed = track(event.notification());
            close_scope.notification_close(&displayed);
            forget(&displayed);
        },
    )?;

    listen(&global, "message", move |event: web_sys::ExtendableMessageEvent| {
        let scope = Rc::clone(&scope);
        let data = js_to_json(event.data());
        wait_until(&event, async move {
            scope.message(&data).await;
            Ok(JsValue::UNDEFINED)
        });
    })?;

    Ok(())
}
