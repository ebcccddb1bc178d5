#![doc = include_str!("README.md")]
mod app;
mod bridge;
mod client;
mod config;
pub mod constants;
pub mod error;
mod logger;
mod setup;
mod types;

pub use app::{AppRegistry, FirebaseApp};
pub use bridge::{BridgeState, MessagingBridge};
pub use client::{default_background_handler, service_worker_factory, Messaging, MessagingFactory};
pub use config::{ConfigSource, HttpConfigSource, StaticConfigSource};
pub use setup::{spawn_background_handler_setup, SetupHandle, SetupOutcome, SetupPolicy};
pub use types::{
    BackgroundMessageHandler, ExecutionContext, FcmOptions, FirebaseConfig, MessagePayload,
    NotificationPayload, Unsubscribe,
};
