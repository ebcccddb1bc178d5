#![doc = include_str!("README.md")]
mod center;
pub mod error;
mod payload;
mod receiver;
mod types;

pub use center::{InMemoryNotificationCenter, NotificationCenter};
pub use payload::{PushNotificationFields, PushPayload};
pub use receiver::{DataMessageRoute, PushOutcome, PushReceiver};
pub use types::{
    DisplayedNotification, Notification, NotificationAction, NotificationDefaults,
    NotificationOptions,
};
