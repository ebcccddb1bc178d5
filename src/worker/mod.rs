#![doc = include_str!("README.md")]
pub mod config;
mod control;
pub mod error;
mod events;
pub(crate) mod logger;
mod registration;
mod scope;

pub use config::WorkerConfig;
pub use control::{InMemoryWorkerControl, WorkerControl};
pub use events::{ClientMessage, MessageOutcome, FIREBASE_CONFIG_MESSAGE, SKIP_WAITING_MESSAGE};
pub use registration::{
    default_update_poll_interval, firebase_config_message, skip_waiting_message,
    spawn_update_poller, update_available, RegistrationOptions, UpdateChecker, UpdatePoller,
    UpdateViaCache, APP_SHELL_SCOPE, APP_SHELL_SCRIPT_URL, MESSAGING_SCOPE, MESSAGING_SCRIPT_URL,
};
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use registration::{
    post_to_controller, post_to_waiting, register, unregister_all, RegistrationUpdater,
};
pub use scope::{LifecycleState, ServiceWorkerScope, ServiceWorkerScopeBuilder};
