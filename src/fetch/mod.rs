#![doc = include_str!("README.md")]
pub mod error;
mod handler;
mod network;
mod types;

pub use handler::{FetchHandler, FetchOutcome, OFFLINE_BODY};
#[cfg(not(target_arch = "wasm32"))]
pub use network::HttpNetwork;
pub use network::Network;
pub use types::{Method, Request, Response};
