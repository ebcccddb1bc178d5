//! Named cache stores, modelled on the `CacheStorage`/`Cache` pair of the service worker
//! platform.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::cache::error::CacheResult;
use crate::fetch::{Request, Response};

/// One cache generation: request URL to response entries.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait Cache: Send + Sync {
    fn name(&self) -> &str;

    /// Stores `response` under the request key, replacing any previous entry.
    async fn put(&self, request: &Request, response: Response) -> CacheResult<()>;

    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>>;

    async fn delete(&self, request: &Request) -> CacheResult<bool>;

    async fn keys(&self) -> CacheResult<Vec<String>>;
}

/// The set of cache generations visible to the worker.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait CacheStorage: Send + Sync {
    /// Opens the named generation, creating it when absent.
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Cache>>;

    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Generation names in creation order.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Looks the request up in every generation, oldest first.
    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        for name in self.keys().await? {
            let cache = self.open(&name).await?;
            if let Some(response) = cache.match_request(request).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// Process-local cache storage used by headless hosts and tests.
#[derive(Default)]
pub struct InMemoryCacheStorage {
    caches: Mutex<Vec<Arc<InMemoryCache>>>,
}

impl InMemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Option<Arc<InMemoryCache>> {
        self.caches
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .iter()
            .find(|cache| cache.name == name)
            .cloned()
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
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Cache>> {
        let mut caches = self.caches.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Some(existing) = caches.iter().find(|cache| cache.name == name) {
            return Ok(existing.clone());
        }
        let cache = Arc::new(InMemoryCache::new(name));
        caches.push(cache.clone());
        Ok(cache)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.find(name).is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .caches
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .iter()
            .map(|cache| cache.name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut caches = self.caches.lock().unwrap_or_else(|poison| poison.into_inner());
        let before = caches.len();
        caches.retain(|cache| cache.name != name);
        Ok(caches.len() != before)
    }
}

pub struct InMemoryCache {
    name: String,
    entries: Mutex<BTreeMap<String, Response>>,
}

impl InMemoryCache {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(BTreeMap::new()),
        }
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
impl Cache for InMemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, request: &Request, response: Response) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(request.cache_key().to_string(), response);
        Ok(())
    }

    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(request.cache_key())
            .cloned())
    }

    async fn delete(&self, request: &Request) -> CacheResult<bool> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(request.cache_key())
            .is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn open_is_idempotent_and_ordered() {
        let storage = InMemoryCacheStorage::new();
        let first = storage.open("b").await.unwrap();
        storage.open("a").await.unwrap();
        let again = storage.open("b").await.unwrap();

        first
            .put(&Request::get("/x"), Response::new(200, "x"))
            .await
            .unwrap();
        assert!(again.match_request(&Request::get("/x")).await.unwrap().is_some());
        assert_eq!(storage.keys().await.unwrap(), vec!["b", "a"]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn match_request_searches_every_generation() {
        let storage = InMemoryCacheStorage::new();
        storage.open("empty").await.unwrap();
        let full = storage.open("full").await.unwrap();
        full.put(&Request::get("/page"), Response::new(200, "page"))
            .await
            .unwrap();

        let hit = storage.match_request(&Request::get("/page")).await.unwrap();
        assert_eq!(hit.map(|response| response.text()), Some("page".to_string()));
        assert!(storage
            .match_request(&Request::get("/other"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_removes_generation() {
        let storage = InMemoryCacheStorage::new();
        storage.open("old").await.unwrap();
        assert!(storage.delete("old").await.unwrap());
        assert!(!storage.delete("old").await.unwrap());
        assert!(!storage.has("old").await.unwrap());
    }
}
