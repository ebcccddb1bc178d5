use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clients::error::{match_failed, ClientsResult};

/// Kind of client a query enumerates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientKind {
    #[default]
    Window,
    Worker,
    SharedWorker,
    All,
}

impl ClientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientKind::Window => "window",
            ClientKind::Worker => "worker",
            ClientKind::SharedWorker => "sharedworker",
            ClientKind::All => "all",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub kind: ClientKind,
    pub include_uncontrolled: bool,
}

impl ClientQuery {
    /// Every window, including pages this worker does not control yet.
    pub fn all_windows() -> Self {
        Self {
            kind: ClientKind::Window,
            include_uncontrolled: true,
        }
    }
}

/// A browsing context reachable from the worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
    pub focused: bool,
    pub controlled: bool,
}

/// The worker's view of open pages.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait Clients: Send + Sync {
    async fn match_all(&self, query: ClientQuery) -> ClientsResult<Vec<WindowClient>>;

    async fn focus(&self, client: &WindowClient) -> ClientsResult<()>;

    async fn open_window(&self, url: &str) -> ClientsResult<()>;

    /// Makes this worker the controller of every open page in its scope.
    async fn claim(&self) -> ClientsResult<()>;
}

/// Window list kept in memory, recording focus and open requests.
#[derive(Default)]
pub struct InMemoryClients {
    next_id: AtomicUsize,
    windows: Mutex<Vec<WindowClient>>,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    claimed: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an open window and returns it.
    pub fn add_window(&self, url: impl Into<String>, controlled: bool) -> WindowClient {
        let client = WindowClient {
            id: format!("client-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            url: url.into(),
            focused: false,
            controlled,
        };
        self.windows
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(client.clone());
        client
    }

    pub fn windows(&self) -> Vec<WindowClient> {
        self.windows
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Ids of clients that received focus, in order.
    pub fn focused(&self) -> Vec<String> {
        self.focused
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// URLs of windows opened by the worker, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Makes `match_all` fail, as when the worker is shutting down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
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
impl Clients for InMemoryClients {
    async fn match_all(&self, query: ClientQuery) -> ClientsResult<Vec<WindowClient>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(match_failed("client list unavailable"));
        }
        if !matches!(query.kind, ClientKind::Window | ClientKind::All) {
            return Ok(Vec::new());
        }
        let claimed = self.claimed();
        Ok(self
            .windows()
            .into_iter()
            .filter(|client| query.include_uncontrolled || client.controlled || claimed)
            .collect())
    }

    async fn focus(&self, client: &WindowClient) -> ClientsResult<()> {
        let mut windows = self.windows.lock().unwrap_or_else(|poison| poison.into_inner());
        for window in windows.iter_mut() {
            window.focused = window.id == client.id;
        }
        self.focused
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(client.id.clone());
        Ok(())
    }

    async fn open_window(&self, url: &str) -> ClientsResult<()> {
        let client = self.add_window(url, true);
        self.opened
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(url.to_string());
        self.focus(&client).await
    }

    async fn claim(&self) -> ClientsResult<()> {
        self.claimed.store(true, Ordering::SeqCst);
        let mut windows = self.windows.lock().unwrap_or_else(|poison| poison.into_inner());
        for window in windows.iter_mut() {
            window.controlled = true;
        }
        Ok(())
    }
}
