use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::cache::{CacheManager, CacheStorage, InMemoryCacheStorage};
use crate::clients::{ClickOutcome, ClickRouter, Clients, InMemoryClients, NotificationClick};
use crate::fetch::{FetchHandler, FetchOutcome, Network, Request};
use crate::messaging::{
    default_background_handler, spawn_background_handler_setup, BackgroundMessageHandler,
    BridgeState, ConfigSource, HttpConfigSource, MessagingBridge, SetupHandle,
};
use crate::push::{
    DataMessageRoute, DisplayedNotification, InMemoryNotificationCenter, NotificationCenter,
    PushOutcome, PushReceiver,
};
use crate::worker::config::WorkerConfig;
use crate::worker::control::{InMemoryWorkerControl, WorkerControl};
use crate::worker::error::{install_failed, invalid_config, invalid_state, WorkerResult};
use crate::worker::events::{ClientMessage, MessageOutcome};
use crate::worker::logger::LOGGER;

/// Where the worker is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Script evaluated, install not started.
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Controls pages and receives fetch events.
    Activated,
    /// Install failed; this worker will never activate.
    Redundant,
}

/// The worker global scope: receives lifecycle and functional events and dispatches them
/// to the cache manager, fetch handler, push receiver, click router and messaging bridge.
///
/// Every event method returns a future the host must keep the event alive for.
pub struct ServiceWorkerScope {
    config: WorkerConfig,
    state: Mutex<LifecycleState>,
    cache: Option<CacheManager>,
    fetch: Option<FetchHandler>,
    push: PushReceiver,
    clicks: ClickRouter,
    clients: Arc<dyn Clients>,
    control: Arc<dyn WorkerControl>,
    bridge: Option<Arc<MessagingBridge>>,
    background_handler: BackgroundMessageHandler,
    setup: Mutex<Option<SetupHandle>>,
}

impl ServiceWorkerScope {
    pub fn builder(config: WorkerConfig) -> ServiceWorkerScopeBuilder {
        ServiceWorkerScopeBuilder::new(config)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    pub fn bridge(&self) -> Option<&Arc<MessagingBridge>> {
        self.bridge.as_ref()
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Moves `from -> to`, failing if the worker is elsewhere.
    fn transition(&self, from: LifecycleState, to: LifecycleState) -> WorkerResult<()> {
        let mut state = self.lock_state();
        if *state != from {
            return Err(invalid_state(format!(
                "cannot move to {to:?} from {:?}",
                *state
            )));
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: LifecycleState) {
        *self.lock_state() = to;
    }

    /// Starts work that runs from script evaluation on: the background message handler
    /// setup task when messaging is enabled. Calling it again is a no-op.
    pub fn start(&self) -> bool {
        let Some(bridge) = &self.bridge else {
            return false;
        };
        let mut setup = self.setup.lock().unwrap_or_else(|poison| poison.into_inner());
        if setup.is_some() {
            return false;
        }
        *setup = Some(spawn_background_handler_setup(
            Arc::clone(bridge),
            self.background_handler.clone(),
            self.config.setup_policy(),
        ));
        LOGGER.debug("Firebase messaging service worker loaded");
        true
    }

    /// Hands out the setup task handle, e.g. to await or cancel it.
    pub fn take_setup_handle(&self) -> Option<SetupHandle> {
        self.setup
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take()
    }

    /// Runs the install phase: static caching and messaging initialization, concurrently.
    ///
    /// A caching failure makes the worker redundant and is returned. Messaging failures are
    /// logged only; the worker installs without a messaging client.
    pub async fn install(&self) -> WorkerResult<()> {
        self.transition(LifecycleState::Parsed, LifecycleState::Installing)?;
        LOGGER.info("Service Worker: Installing...");

        let caching = async {
            match &self.cache {
                Some(cache) => cache.install().await,
                None => Ok(()),
            }
        };
        let messaging = async {
            match &self.bridge {
                Some(bridge) => Some(bridge.initialize_from_endpoint().await),
                None => None,
            }
        };
        let (cached, bridge_state) = futures::join!(caching, messaging);

        if let Some(state) = bridge_state {
            if state != BridgeState::MessagingReady {
                LOGGER.warn(format!(
                    "Firebase messaging could not be initialized during install ({state:?})"
                ));
            }
        }

        if let Err(err) = cached {
            self.set_state(LifecycleState::Redundant);
            return Err(install_failed(format!("static caching failed: {err}")));
        }

        self.set_state(LifecycleState::Installed);
        LOGGER.info("Service Worker: Installed");

        if self.config.skip_waiting_on_install {
            if let Err(err) = self.control.skip_waiting().await {
                LOGGER.warn(format!("skipWaiting failed: {err}"));
            }
        }
        Ok(())
    }

    /// Runs the activate phase: evicts stale cache generations and claims clients.
    /// Returns the deleted generation names.
    pub async fn activate(&self) -> WorkerResult<Vec<String>> {
        self.transition(LifecycleState::Installed, LifecycleState::Activating)?;
        LOGGER.info("Service Worker: Activating...");

        let deleted = match &self.cache {
            Some(cache) => match cache.activate().await {
                Ok(deleted) => deleted,
                Err(err) => {
                    LOGGER.error(format!("failed to evict old caches: {err}"));
                    Vec::new()
                }
            },
            None => {
                if let Err(err) = self.clients.claim().await {
                    LOGGER.warn(format!("failed to claim clients: {err}"));
                }
                Vec::new()
            }
        };

        self.set_state(LifecycleState::Activated);
        LOGGER.info("Service Worker: Activated");
        Ok(deleted)
    }

    /// Whether `fetch` would answer this request rather than pass it through. Hosts that
    /// must decide synchronously (`respondWith`) ask this first.
    pub fn intercepts(&self, request: &Request) -> bool {
        self.fetch.is_some() && request.is_get() && self.state() == LifecycleState::Activated
    }

    /// Intercepts a page request. Until activation, or when caching is off, the request
    /// passes through to the network.
    pub async fn fetch(&self, request: Request) -> FetchOutcome {
        if !self.intercepts(&request) {
            return FetchOutcome::Passthrough;
        }
        match &self.fetch {
            Some(handler) => handler.handle(request).await,
            None => FetchOutcome::Passthrough,
        }
    }

    pub async fn push(&self, data: Option<&[u8]>) -> PushOutcome {
        LOGGER.debug("Push event received");
        let messaging = self.bridge.as_ref().and_then(|bridge| bridge.messaging());
        let route = messaging
            .as_ref()
            .map(|messaging| messaging as &dyn DataMessageRoute);
        self.push.receive(data, route).await
    }

    pub async fn notification_click(&self, click: NotificationClick) -> ClickOutcome {
        LOGGER.debug(format!(
            "Notification clicked: {} ({:?})",
            click.notification.title, click.action
        ));
        self.clicks.route(click).await
    }

    pub fn notification_close(&self, notification: &DisplayedNotification) {
        LOGGER.info(format!("Notification closed: {}", notification.title));
    }

    /// Handles a message posted by a page.
    pub async fn message(&self, data: &Value) -> MessageOutcome {
        let message = match ClientMessage::parse(data) {
            Ok(Some(message)) => message,
            Ok(None) => return MessageOutcome::Ignored,
            Err(err) => {
                LOGGER.warn(format!("rejecting message: {err}"));
                return MessageOutcome::Rejected;
            }
        };

        match message {
            ClientMessage::FirebaseConfig { config } => match &self.bridge {
                Some(bridge) => {
                    let state = bridge.receive_config(config);
                    MessageOutcome::ConfigApplied {
                        messaging_ready: state == BridgeState::MessagingReady,
                    }
                }
                None => {
                    LOGGER.debug("FIREBASE_CONFIG ignored: messaging is disabled");
                    MessageOutcome::Ignored
                }
            },
            ClientMessage::SkipWaiting => match self.control.skip_waiting().await {
                Ok(()) => MessageOutcome::SkippedWaiting,
                Err(err) => {
                    LOGGER.warn(format!("skipWaiting failed: {err}"));
                    MessageOutcome::Rejected
                }
            },
        }
    }
}

/// Wires host capabilities into a [`ServiceWorkerScope`].
///
/// Caches, notifications, clients and worker control default to the in-memory hosts. A
/// network is required when caching is on, or when messaging is on without an explicit
/// config source.
pub struct ServiceWorkerScopeBuilder {
    config: WorkerConfig,
    caches: Option<Arc<dyn CacheStorage>>,
    network: Option<Arc<dyn Network>>,
    notifications: Option<Arc<dyn NotificationCenter>>,
    clients: Option<Arc<dyn Clients>>,
    control: Option<Arc<dyn WorkerControl>>,
    config_source: Option<Arc<dyn ConfigSource>>,
    background_handler: Option<BackgroundMessageHandler>,
}

impl ServiceWorkerScopeBuilder {
    fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            caches: None,
            network: None,
            notifications: None,
            clients: None,
            control: None,
            config_source: None,
            background_handler: None,
        }
    }

    pub fn caches(mut self, caches: Arc<dyn CacheStorage>) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn network(mut self, network: Arc<dyn Network>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn notifications(mut self, notifications: Arc<dyn NotificationCenter>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn clients(mut self, clients: Arc<dyn Clients>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn control(mut self, control: Arc<dyn WorkerControl>) -> Self {
        self.control = Some(control);
        self
    }

    pub fn config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = Some(source);
        self
    }

    pub fn background_handler(mut self, handler: BackgroundMessageHandler) -> Self {
        self.background_handler = Some(handler);
        self
    }

    pub fn build(self) -> WorkerResult<ServiceWorkerScope> {
        let config = self.config;
        config.validate()?;

        let caches = self
            .caches
            .unwrap_or_else(|| Arc::new(InMemoryCacheStorage::new()));
        let notifications = self
            .notifications
            .unwrap_or_else(|| Arc::new(InMemoryNotificationCenter::new()));
        let clients = self
            .clients
            .unwrap_or_else(|| Arc::new(InMemoryClients::new()));
        let control = self
            .control
            .unwrap_or_else(|| Arc::new(InMemoryWorkerControl::new()));

        let (cache, fetch) = if config.caching {
            let network = self
                .network
                .clone()
                .ok_or_else(|| invalid_config("caching requires a network"))?;
            let cache = CacheManager::new(
                Arc::clone(&caches),
                Arc::clone(&network),
                Arc::clone(&clients),
                config.cache_names(),
                config.static_assets.clone(),
            );
            let fetch = FetchHandler::new(
                network,
                caches,
                config.cache_names(),
                config.offline_url.clone(),
            );
            (Some(cache), Some(fetch))
        } else {
            (None, None)
        };

        let bridge = if config.messaging {
            let source = match (self.config_source, &self.network) {
                (Some(source), _) => source,
                (None, Some(network)) => Arc::new(HttpConfigSource::with_endpoint(
                    Arc::clone(network),
                    config.config_endpoint.clone(),
                )) as Arc<dyn ConfigSource>,
                (None, None) => {
                    return Err(invalid_config(
                        "messaging requires a network or a config source",
                    ))
                }
            };
            Some(Arc::new(MessagingBridge::new(source)))
        } else {
            None
        };

        let background_handler = self
            .background_handler
            .unwrap_or_else(|| default_background_handler(config.notifications.clone()));

        Ok(ServiceWorkerScope {
            push: PushReceiver::new(Arc::clone(&notifications), config.notifications.clone()),
            clicks: ClickRouter::new(
                Arc::clone(&clients),
                notifications,
                config.notifications.default_url.clone(),
            ),
            state: Mutex::new(LifecycleState::Parsed),
            config,
            cache,
            fetch,
            clients,
            control,
            bridge,
            background_handler,
            setup: Mutex::new(None),
        })
    }
}
