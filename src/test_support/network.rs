use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::fetch::error::{unreachable, NetworkResult};
use crate::fetch::{Network, Request, Response};

/// Scripted network: fixed routes, an optional catch-all, and an offline switch.
///
/// Unknown URLs are unreachable unless `echoing` was set.
#[derive(Default)]
pub struct FixtureNetwork {
    routes: HashMap<String, (u16, String)>,
    echo_status: Option<u16>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FixtureNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers each URL with `200` and the body `body of <url>`.
    pub fn serving(urls: &[&str]) -> Self {
        urls.iter().fold(Self::new(), |network, url| {
            network.with_route(url, 200, format!("body of {url}"))
        })
    }

    pub fn with_route(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(url.to_string(), (status, body.into()));
        self
    }

    /// Answers unknown URLs with `status` and the body `fresh <url>`.
    pub fn echoing(mut self, status: u16) -> Self {
        self.echo_status = Some(status);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
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
impl Network for FixtureNetwork {
    async fn fetch(&self, request: &Request) -> NetworkResult<Response> {
        self.calls.lock().unwrap().push(request.url.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable(format!("offline: {}", request.url)));
        }
        if let Some((status, body)) = self.routes.get(&request.url) {
            return Ok(Response::new(*status, body.clone()).with_url(request.url.clone()));
        }
        match self.echo_status {
            Some(status) => Ok(Response::new(status, format!("fresh {}", request.url))
                .with_url(request.url.clone())),
            None => Err(unreachable(format!("no route to {}", request.url))),
        }
    }
}
