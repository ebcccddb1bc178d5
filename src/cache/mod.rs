#![doc = include_str!("README.md")]
pub mod constants;
pub mod error;
mod manager;
mod names;
mod storage;

pub use manager::CacheManager;
pub use names::CacheNames;
pub use storage::{Cache, CacheStorage, InMemoryCache, InMemoryCacheStorage};
