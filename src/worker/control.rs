use std::sync::atomic::{AtomicUsize, Ordering};

use crate::worker::error::WorkerResult;

/// Control over the worker's own registration.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait WorkerControl: Send + Sync {
    /// Activates this worker without waiting for pages of the previous one to close.
    async fn skip_waiting(&self) -> WorkerResult<()>;
}

/// Records `skip_waiting` calls.
#[derive(Debug, Default)]
pub struct InMemoryWorkerControl {
    skip_waiting_calls: AtomicUsize,
}

impl InMemoryWorkerControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting_calls.load(Ordering::SeqCst)
    }
}

#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
impl WorkerControl for InMemoryWorkerControl {
    async fn skip_waiting(&self) -> WorkerResult<()> {
        self.skip_waiting_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
