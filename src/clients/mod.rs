#![doc = include_str!("README.md")]
pub mod error;
mod host;
mod router;

pub use host::{ClientKind, ClientQuery, Clients, InMemoryClients, WindowClient};
pub use router::{ClickOutcome, ClickRouter, NotificationClick, DISMISS_ACTION};
