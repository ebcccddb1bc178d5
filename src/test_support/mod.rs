//! Test utilities shared across crate-level unit tests.

pub mod firebase;
pub mod network;

pub use firebase::complete_firebase_config;
pub use network::FixtureNetwork;
