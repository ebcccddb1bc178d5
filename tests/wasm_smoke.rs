#![cfg(all(target_arch = "wasm32", feature = "wasm-web"))]

use std::sync::Arc;

use cooltrack_sw::fetch::{Network, Request};
use cooltrack_sw::platform::browser::{worker_global, BrowserNetwork};
use cooltrack_sw::push::{InMemoryNotificationCenter, NotificationDefaults, PushOutcome, PushReceiver};
use cooltrack_sw::worker::{skip_waiting_message, RegistrationOptions, WorkerConfig};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn page_is_not_a_worker_global() {
    assert!(worker_global().is_none());
}

#[wasm_bindgen_test(async)]
async fn browser_network_requires_worker_global() {
    let result = BrowserNetwork::new().fetch(&Request::get("/")).await;
    assert!(result.is_err());
}

#[wasm_bindgen_test(async)]
async fn push_receiver_runs_in_the_browser() {
    let center = Arc::new(InMemoryNotificationCenter::new());
    let receiver = PushReceiver::new(center.clone(), NotificationDefaults::app_shell());
    let outcome = receiver.receive(Some(b"{}".as_slice()), None).await;
    assert_eq!(
        outcome,
        PushOutcome::Displayed {
            title: "Cool Track".into()
        }
    );
    assert!(center.shown()[0].data()["timestamp"].is_i64());
}

#[wasm_bindgen_test]
fn registration_presets_match_the_app() {
    assert_eq!(RegistrationOptions::default().script_url, "/sw.js");
    assert_eq!(
        RegistrationOptions::firebase_messaging().script_url,
        "/firebase-messaging-sw.js"
    );
    assert_eq!(skip_waiting_message()["type"], "SKIP_WAITING");
    assert!(WorkerConfig::from_json("{}").is_ok());
}
