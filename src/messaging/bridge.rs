use std::sync::{Arc, Mutex, MutexGuard};

use crate::messaging::app::{AppRegistry, FirebaseApp};
use crate::messaging::client::{service_worker_factory, Messaging, MessagingFactory};
use crate::messaging::config::ConfigSource;
use crate::messaging::logger::LOGGER;
use crate::messaging::types::FirebaseConfig;

/// Initialization progress of the worker's messaging client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    /// The config endpoint request is in flight.
    FetchingConfig,
    /// A config is stored and nobody has started building the app yet.
    ConfigReady,
    Initializing,
    /// The app exists but the messaging client could not be built. Final.
    AppReady,
    MessagingReady,
}

impl BridgeState {
    /// Whether an app has been (or is being) initialized, after which configs are ignored.
    pub fn has_app(self) -> bool {
        matches!(
            self,
            BridgeState::Initializing | BridgeState::AppReady | BridgeState::MessagingReady
        )
    }
}

struct BridgeInner {
    state: BridgeState,
    config: Option<FirebaseConfig>,
    app: Option<FirebaseApp>,
    messaging: Option<Messaging>,
}

/// Owns the worker's Firebase app and messaging client and serializes the two ways they
/// can be initialized: a config posted by a page and the config endpoint fetched during
/// install.
///
/// All transitions happen under a mutex that is never held across an await, so whichever
/// path reaches `ConfigReady -> Initializing` first builds the app and the other observes
/// the result.
pub struct MessagingBridge {
    inner: Mutex<BridgeInner>,
    source: Arc<dyn ConfigSource>,
    apps: Arc<AppRegistry>,
    factory: MessagingFactory,
}

impl MessagingBridge {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self::with_parts(source, Arc::new(AppRegistry::new()), service_worker_factory())
    }

    pub fn with_parts(
        source: Arc<dyn ConfigSource>,
        apps: Arc<AppRegistry>,
        factory: MessagingFactory,
    ) -> Self {
        Self {
            inner: Mutex::new(BridgeInner {
                state: BridgeState::Uninitialized,
                config: None,
                app: None,
                messaging: None,
            }),
            source,
            apps,
            factory,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeInner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn state(&self) -> BridgeState {
        self.lock().state
    }

    pub fn config(&self) -> Option<FirebaseConfig> {
        self.lock().config.clone()
    }

    pub fn app(&self) -> Option<FirebaseApp> {
        self.lock().app.clone()
    }

    pub fn messaging(&self) -> Option<Messaging> {
        self.lock().messaging.clone()
    }

    /// Handles a config posted by a page.
    ///
    /// The config is kept only while no app exists. A config arriving while the endpoint
    /// request is in flight wins over the fetched one.
    pub fn receive_config(&self, config: FirebaseConfig) -> BridgeState {
        {
            let mut inner = self.lock();
            if inner.state.has_app() {
                LOGGER.debug("Firebase config received after initialization; ignoring");
                return inner.state;
            }
            LOGGER.debug("Firebase config received in service worker");
            inner.config = Some(config);
            inner.state = BridgeState::ConfigReady;
        }
        let state = self.initialize();
        if state == BridgeState::MessagingReady {
            LOGGER.info("Firebase messaging initialized successfully");
        }
        state
    }

    /// Fetches the config from the endpoint and initializes, unless initialization has
    /// already started by another path.
    pub async fn initialize_from_endpoint(&self) -> BridgeState {
        {
            let mut inner = self.lock();
            if inner.state != BridgeState::Uninitialized {
                return inner.state;
            }
            inner.state = BridgeState::FetchingConfig;
        }

        let loaded = self.source.load().await;

        {
            let mut inner = self.lock();
            match loaded {
                Ok(config) => match inner.state {
                    // `Uninitialized` here means a message config arrived mid-fetch and
                    // failed to initialize; the fetched one still gets its turn.
                    BridgeState::FetchingConfig | BridgeState::Uninitialized => {
                        inner.config = Some(config);
                        inner.state = BridgeState::ConfigReady;
                    }
                    _ => LOGGER.debug(
                        "config arrived by message during fetch; discarding fetched config",
                    ),
                },
                Err(err) => {
                    if inner.state == BridgeState::FetchingConfig {
                        inner.state = BridgeState::Uninitialized;
                    }
                    LOGGER.error(format!(
                        "No Firebase config available, cannot initialize: {err}"
                    ));
                    return inner.state;
                }
            }
        }

        let state = self.initialize();
        match state {
            BridgeState::MessagingReady => {
                LOGGER.info("Firebase messaging initialized in service worker install")
            }
            _ => LOGGER.warn("Firebase messaging could not be initialized during install"),
        }
        state
    }

    /// Builds the app and messaging client from the stored config. Only the caller that
    /// moves the state out of `ConfigReady` does the work.
    fn initialize(&self) -> BridgeState {
        let config = {
            let mut inner = self.lock();
            if inner.state != BridgeState::ConfigReady {
                return inner.state;
            }
            let Some(config) = inner.config.clone() else {
                inner.state = BridgeState::Uninitialized;
                return inner.state;
            };
            inner.state = BridgeState::Initializing;
            config
        };

        let app = match self.apps.initialize_app(config) {
            Ok(app) => app,
            Err(err) => {
                LOGGER.error(format!("Error initializing Firebase: {err}"));
                let mut inner = self.lock();
                inner.config = None;
                inner.state = BridgeState::Uninitialized;
                return inner.state;
            }
        };

        let messaging = (self.factory)(&app);

        let mut inner = self.lock();
        inner.app = Some(app);
        match messaging {
            Ok(messaging) => {
                inner.messaging = Some(messaging);
                inner.state = BridgeState::MessagingReady;
            }
            Err(err) => {
                LOGGER.error(format!("Error initializing Firebase messaging: {err}"));
                inner.state = BridgeState::AppReady;
            }
        }
        inner.state
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::messaging::config::StaticConfigSource;
    use crate::messaging::error::{config_fetch_failed, internal_error, MessagingResult};
    use crate::test_support::complete_firebase_config;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn static_bridge(project: &str) -> MessagingBridge {
        MessagingBridge::new(Arc::new(StaticConfigSource::new(
            complete_firebase_config(project),
        )))
    }

    /// Config source that parks until released, so tests can interleave a message.
    struct GatedSource {
        release: async_channel::Receiver<MessagingResult<FirebaseConfig>>,
    }

    #[async_trait::async_trait]
    impl ConfigSource for GatedSource {
        async fn load(&self) -> MessagingResult<FirebaseConfig> {
            self.release
                .recv()
                .await
                .unwrap_or_else(|_| Err(config_fetch_failed("gate closed")))
        }
    }

    fn counting_factory(counter: Arc<AtomicUsize>) -> MessagingFactory {
        let inner = service_worker_factory();
        Arc::new(move |app: &FirebaseApp| {
            counter.fetch_add(1, Ordering::SeqCst);
            inner(app)
        })
    }

    #[tokio::test(flavor = "current_thread")]
    async fn endpoint_config_reaches_messaging_ready() {
        let bridge = static_bridge("cool-track");
        assert_eq!(bridge.state(), BridgeState::Uninitialized);

        let state = bridge.initialize_from_endpoint().await;

        assert_eq!(state, BridgeState::MessagingReady);
        assert!(bridge.messaging().is_some());
        assert_eq!(
            bridge.initialize_from_endpoint().await,
            BridgeState::MessagingReady
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_paths_build_exactly_one_app() {
        let (tx, rx) = async_channel::bounded(1);
        let apps = Arc::new(AppRegistry::new());
        let built = Arc::new(AtomicUsize::new(0));
        let bridge = MessagingBridge::with_parts(
            Arc::new(GatedSource { release: rx }),
            apps.clone(),
            counting_factory(built.clone()),
        );

        let install = bridge.initialize_from_endpoint();
        let message = async {
            tokio::task::yield_now().await;
            assert_eq!(bridge.state(), BridgeState::FetchingConfig);
            let state = bridge.receive_config(complete_firebase_config("from-message"));
            tx.send(Ok(complete_firebase_config("from-endpoint"))).await.unwrap();
            state
        };
        let (install_state, message_state) = tokio::join!(install, message);

        assert_eq!(message_state, BridgeState::MessagingReady);
        assert_eq!(install_state, BridgeState::MessagingReady);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(apps.len(), 1);
        assert_eq!(
            bridge.app().unwrap().options().project_id.as_deref(),
            Some("from-message")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetched_config_recovers_from_rejected_message_config() {
        let (tx, rx) = async_channel::bounded(1);
        let bridge = MessagingBridge::new(Arc::new(GatedSource { release: rx }));

        let install = bridge.initialize_from_endpoint();
        let message = async {
            tokio::task::yield_now().await;
            assert_eq!(bridge.state(), BridgeState::FetchingConfig);
            let state = bridge.receive_config(FirebaseConfig::default());
            tx.send(Ok(complete_firebase_config("cool-track"))).await.unwrap();
            state
        };
        let (install_state, message_state) = tokio::join!(install, message);

        assert_eq!(message_state, BridgeState::Uninitialized);
        assert_eq!(install_state, BridgeState::MessagingReady);
        assert!(bridge.messaging().is_some());
        assert_eq!(
            bridge.app().unwrap().options().project_id.as_deref(),
            Some("cool-track")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn config_after_initialization_is_ignored() {
        let bridge = static_bridge("cool-track");
        bridge.initialize_from_endpoint().await;
        let before = bridge.messaging().unwrap();

        let state = bridge.receive_config(complete_firebase_config("other"));

        assert_eq!(state, BridgeState::MessagingReady);
        assert!(bridge.messaging().unwrap().app().ptr_eq(before.app()));
        assert_eq!(
            bridge.config().unwrap().project_id.as_deref(),
            Some("cool-track")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_failure_returns_to_uninitialized() {
        let (tx, rx) = async_channel::bounded(1);
        let bridge = MessagingBridge::new(Arc::new(GatedSource { release: rx }));
        tx.send(Err(config_fetch_failed("status 503"))).await.unwrap();

        let state = bridge.initialize_from_endpoint().await;

        assert_eq!(state, BridgeState::Uninitialized);
        assert!(bridge.messaging().is_none());
        assert_eq!(
            bridge.receive_config(complete_firebase_config("late")),
            BridgeState::MessagingReady
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_messaging_values_leave_app_ready() {
        let bridge = MessagingBridge::new(Arc::new(StaticConfigSource::new(FirebaseConfig {
            project_id: Some("cool-track".into()),
            ..Default::default()
        })));

        assert_eq!(bridge.initialize_from_endpoint().await, BridgeState::AppReady);
        assert!(bridge.app().is_some());
        assert!(bridge.messaging().is_none());

        assert_eq!(
            bridge.receive_config(complete_firebase_config("cool-track")),
            BridgeState::AppReady
        );
        assert!(bridge.messaging().is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn factory_failure_is_permanent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let bridge = MessagingBridge::with_parts(
            Arc::new(StaticConfigSource::new(complete_firebase_config("cool-track"))),
            Arc::new(AppRegistry::new()),
            Arc::new(move |_app: &FirebaseApp| -> MessagingResult<Messaging> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(internal_error("messaging unavailable"))
            }),
        );

        assert_eq!(
            bridge.receive_config(complete_firebase_config("cool-track")),
            BridgeState::AppReady
        );
        assert_eq!(
            bridge.initialize_from_endpoint().await,
            BridgeState::AppReady
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
