//! Runtime and host bindings.
//!
//! `runtime` hides the difference between tokio (native) and the browser event loop
//! (wasm). `browser` wires the worker components to the real `ServiceWorkerGlobalScope`
//! and is only compiled with the `wasm-web` feature on `wasm32`.

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod browser;
pub mod runtime;
