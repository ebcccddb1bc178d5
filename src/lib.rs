#![doc = include_str!("RUSTDOC.md")]

pub mod cache;
pub mod clients;
pub mod fetch;
pub mod logger;
pub mod messaging;
pub mod platform;
pub mod push;
pub mod worker;

#[cfg(test)]
pub mod test_support;
