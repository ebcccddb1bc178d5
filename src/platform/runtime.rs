use std::future::Future;
use std::time::Duration;

/// Spawns a background task on the browser event loop.
#[cfg(target_arch = "wasm32")]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Spawns a background task on the current tokio runtime, or on a shared
/// single-threaded runtime when called outside of one.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::LazyLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cooltrack-sw-background")
            .enable_all()
            .build()
            .expect("failed to build background tokio runtime")
    });

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else {
        BACKGROUND_RUNTIME.spawn(future);
    }
}

/// Waits for `duration` without blocking the event loop.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    sleep_impl(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_impl(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_impl(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Milliseconds since the unix epoch, used to stamp notification data.
pub fn now_millis() -> i64 {
    #[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
    {
        js_sys::Date::now() as i64
    }

    #[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
    {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(flavor = "current_thread")]
    async fn spawned_task_runs_on_current_runtime() {
        let (tx, rx) = async_channel::bounded(1);
        spawn_detached(async move {
            let _ = tx.send(7u8).await;
        });
        assert_eq!(rx.recv().await.unwrap(), 7);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn zero_sleep_returns_immediately() {
        let start = Instant::now();
        sleep(Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
