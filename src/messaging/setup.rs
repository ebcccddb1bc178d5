use std::sync::Arc;
use std::time::Duration;

use futures::future::{abortable, AbortHandle};

use crate::messaging::bridge::MessagingBridge;
use crate::messaging::constants::{DEFAULT_MAX_SETUP_ATTEMPTS, DEFAULT_SETUP_RETRY_INTERVAL};
use crate::messaging::logger::LOGGER;
use crate::messaging::types::BackgroundMessageHandler;
use crate::platform::runtime;

/// How often and how long the setup task waits for a messaging client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPolicy {
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl Default for SetupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_SETUP_ATTEMPTS,
            retry_interval: DEFAULT_SETUP_RETRY_INTERVAL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The handler was registered on the given attempt.
    Registered { attempt: u32 },
    /// A client exists but cannot take background handlers.
    Unsupported,
    /// No client appeared within the attempt budget.
    Exhausted { attempts: u32 },
    Cancelled,
}

/// Handle on a running background-handler setup task.
pub struct SetupHandle {
    abort: AbortHandle,
    outcome: async_channel::Receiver<SetupOutcome>,
}

impl SetupHandle {
    /// Stops the task before its next check. Has no effect once it finished.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        !self.outcome.is_empty() || self.outcome.is_closed()
    }

    /// Waits for the task to finish.
    pub async fn outcome(self) -> SetupOutcome {
        self.outcome
            .recv()
            .await
            .unwrap_or(SetupOutcome::Cancelled)
    }
}

/// Starts the task that registers `handler` once the bridge has a messaging client.
///
/// The task checks every `policy.retry_interval`, at most `policy.max_attempts` times, and
/// is never restarted: after the last attempt it logs a terminal error and stops.
pub fn spawn_background_handler_setup(
    bridge: Arc<MessagingBridge>,
    handler: BackgroundMessageHandler,
    policy: SetupPolicy,
) -> SetupHandle {
    let (sender, receiver) = async_channel::bounded(1);
    let (task, abort) = abortable(async move {
        let outcome = run_setup(&bridge, handler, policy).await;
        let _ = sender.send(outcome).await;
    });
    runtime::spawn_detached(async move {
        let _ = task.await;
    });
    SetupHandle {
        abort,
        outcome: receiver,
    }
}

async fn run_setup(
    bridge: &MessagingBridge,
    handler: BackgroundMessageHandler,
    policy: SetupPolicy,
) -> SetupOutcome {
    let max = policy.max_attempts;
    for attempt in 1..=max {
        runtime::sleep(policy.retry_interval).await;

        if let Some(messaging) = bridge.messaging() {
            return match messaging.on_background_message(handler) {
                Ok(_unsubscribe) => {
                    LOGGER.info("Background message handler set up");
                    SetupOutcome::Registered { attempt }
                }
                Err(err) => {
                    LOGGER.warn(format!(
                        "Cannot set up background message handler - messaging not available: {err}"
                    ));
                    SetupOutcome::Unsupported
                }
            };
        }

        if attempt < max {
            LOGGER.debug(format!(
                "Retrying background handler setup, attempt {attempt}/{max}"
            ));
        }
    }

    LOGGER.error("Failed to set up background message handler after maximum attempts");
    SetupOutcome::Exhausted { attempts: max }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::logger::test_capture::{capture, serialize};
    use crate::logger::LogLevel;
    use crate::messaging::app::{AppRegistry, FirebaseApp};
    use crate::messaging::client::{default_background_handler, Messaging};
    use crate::messaging::config::StaticConfigSource;
    use crate::messaging::types::ExecutionContext;
    use crate::push::NotificationDefaults;
    use crate::test_support::complete_firebase_config;

    fn fast(max_attempts: u32) -> SetupPolicy {
        SetupPolicy {
            max_attempts,
            retry_interval: Duration::from_millis(5),
        }
    }

    fn handler() -> BackgroundMessageHandler {
        default_background_handler(NotificationDefaults::default())
    }

    fn bridge() -> Arc<MessagingBridge> {
        Arc::new(MessagingBridge::new(Arc::new(StaticConfigSource::new(
            complete_firebase_config("cool-track"),
        ))))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn registers_once_client_appears() {
        let bridge = bridge();
        let handle = spawn_background_handler_setup(bridge.clone(), handler(), fast(10));

        tokio::time::sleep(Duration::from_millis(12)).await;
        bridge.initialize_from_endpoint().await;

        assert!(matches!(
            handle.outcome().await,
            SetupOutcome::Registered { .. }
        ));
        assert!(bridge.messaging().unwrap().has_background_handler());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn gives_up_after_max_attempts_and_logs() {
        let _guard = serialize();
        let records = capture(&LOGGER);

        let handle = spawn_background_handler_setup(bridge(), handler(), fast(3));
        assert_eq!(handle.outcome().await, SetupOutcome::Exhausted { attempts: 3 });

        let records = records.lock().unwrap();
        let retries = records
            .iter()
            .filter(|(_, message)| message.starts_with("Retrying background handler setup"))
            .count();
        assert_eq!(retries, 2);
        assert!(records.iter().any(|(level, message)| *level == LogLevel::Error
            && message == "Failed to set up background message handler after maximum attempts"));
        LOGGER.clear_user_log_handler();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn window_client_is_unsupported() {
        let apps = Arc::new(AppRegistry::new());
        let bridge = Arc::new(MessagingBridge::with_parts(
            Arc::new(StaticConfigSource::new(complete_firebase_config("cool-track"))),
            apps,
            Arc::new(|app: &FirebaseApp| Messaging::new(app.clone(), ExecutionContext::Window)),
        ));
        bridge.initialize_from_endpoint().await;

        let handle = spawn_background_handler_setup(bridge, handler(), fast(3));
        assert_eq!(handle.outcome().await, SetupOutcome::Unsupported);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cancel_stops_the_task() {
        let handle = spawn_background_handler_setup(
            bridge(),
            handler(),
            SetupPolicy {
                max_attempts: 10,
                retry_interval: Duration::from_secs(60),
            },
        );
        handle.cancel();
        assert_eq!(handle.outcome().await, SetupOutcome::Cancelled);
    }
}
