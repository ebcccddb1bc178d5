use std::sync::{Arc, LazyLock};

use crate::cache::{CacheNames, CacheStorage};
use crate::fetch::network::Network;
use crate::fetch::types::{Request, Response};
use crate::logger::Logger;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@cooltrack/fetch"));

/// Body of the response synthesized when neither the network nor any cache can answer.
pub const OFFLINE_BODY: &str = "Offline - Please check your connection";

/// What the host should do with an intercepted request.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// Let the request go to the network untouched.
    Passthrough,
    Respond(Response),
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Respond(response) => Some(response),
        }
    }
}

/// Network-first request handler that falls back to the cache generations when offline.
pub struct FetchHandler {
    network: Arc<dyn Network>,
    caches: Arc<dyn CacheStorage>,
    names: CacheNames,
    offline_url: Option<String>,
}

impl FetchHandler {
    pub fn new(
        network: Arc<dyn Network>,
        caches: Arc<dyn CacheStorage>,
        names: CacheNames,
        offline_url: Option<String>,
    ) -> Self {
        Self {
            network,
            caches,
            names,
            offline_url,
        }
    }

    pub async fn handle(&self, request: Request) -> FetchOutcome {
        if !request.is_get() {
            return FetchOutcome::Passthrough;
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_dynamic(&request, response.clone()).await;
                }
                FetchOutcome::Respond(response)
            }
            Err(err) => {
                LOGGER.debug(format!(
                    "network unavailable for {}: {err}; trying cache",
                    request.url
                ));
                FetchOutcome::Respond(self.offline_response(&request).await)
            }
        }
    }

    async fn store_dynamic(&self, request: &Request, response: Response) {
        let name = self.names.dynamic_name();
        let result = match self.caches.open(&name).await {
            Ok(cache) => cache.put(request, response).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            LOGGER.warn(format!("failed to cache {}: {err}", request.url));
        }
    }

    async fn offline_response(&self, request: &Request) -> Response {
        for name in [self.names.dynamic_name(), self.names.static_name()] {
            if let Some(response) = self.lookup(&name, request).await {
                return response;
            }
        }

        if let Some(offline_url) = &self.offline_url {
            let offline = Request::get(offline_url.as_str());
            match self.caches.match_request(&offline).await {
                Ok(Some(response)) => return response,
                Ok(None) => {}
                Err(err) => LOGGER.warn(format!("offline page lookup failed: {err}")),
            }
        }

        Response::new(503, OFFLINE_BODY)
            .with_status_text("Service Unavailable")
            .with_header("Content-Type", "text/plain")
            .with_url(request.url.clone())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Option<Response> {
        // Probing with `has` keeps a miss from creating an empty generation.
        match self.caches.has(name).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                LOGGER.warn(format!("cache {name} unavailable: {err}"));
                return None;
            }
        }
        let cache = match self.caches.open(name).await {
            Ok(cache) => cache,
            Err(err) => {
                LOGGER.warn(format!("cache {name} unavailable: {err}"));
                return None;
            }
        };
        match cache.match_request(request).await {
            Ok(found) => found,
            Err(err) => {
                LOGGER.warn(format!("lookup of {} in {name} failed: {err}", request.url));
                None
            }
        }
    }
}
