use std::sync::{Arc, LazyLock};

use futures::future::try_join_all;

use crate::cache::error::{install_failed, CacheResult};
use crate::cache::names::CacheNames;
use crate::cache::storage::CacheStorage;
use crate::clients::Clients;
use crate::fetch::{Network, Request, Response};
use crate::logger::Logger;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@cooltrack/cache"));

/// Owns the cache generations of one worker version.
pub struct CacheManager {
    caches: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    clients: Arc<dyn Clients>,
    names: CacheNames,
    manifest: Vec<String>,
}

impl CacheManager {
    pub fn new(
        caches: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<dyn Clients>,
        names: CacheNames,
        manifest: Vec<String>,
    ) -> Self {
        Self {
            caches,
            network,
            clients,
            names,
            manifest,
        }
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Populates the static generation with the manifest.
    ///
    /// Every asset is downloaded before anything is written. If any download fails or
    /// returns a non-ok status, nothing is stored; if a write fails part way, the static
    /// generation is deleted. Either way the error is returned and the install must be
    /// treated as failed.
    pub async fn install(&self) -> CacheResult<()> {
        LOGGER.info("Caching static assets");
        let result = self.populate_static().await;
        match &result {
            Ok(()) => LOGGER.info("Static assets cached"),
            Err(err) => LOGGER.error(format!("Error caching static assets: {err}")),
        }
        result
    }

    async fn populate_static(&self) -> CacheResult<()> {
        let downloads = self.manifest.iter().map(|url| self.download(url));
        let entries = try_join_all(downloads).await?;

        let static_name = self.names.static_name();
        let cache = self.caches.open(&static_name).await?;
        for (request, response) in entries {
            if let Err(err) = cache.put(&request, response).await {
                if let Err(cleanup) = self.caches.delete(&static_name).await {
                    LOGGER.warn(format!(
                        "failed to discard partial cache {static_name}: {cleanup}"
                    ));
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn download(&self, url: &str) -> CacheResult<(Request, Response)> {
        let request = Request::get(url);
        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|err| install_failed(format!("failed to fetch {url}: {err}")))?;
        if !response.ok() {
            return Err(install_failed(format!(
                "{url} returned status {}",
                response.status
            )));
        }
        Ok((request, response))
    }

    /// Deletes every generation outside the reserved set of this version, then claims
    /// open clients. Returns the deleted generation names.
    pub async fn activate(&self) -> CacheResult<Vec<String>> {
        let stale: Vec<String> = self
            .caches
            .keys()
            .await?
            .into_iter()
            .filter(|name| !self.names.is_reserved(name))
            .collect();

        let mut deleted = Vec::with_capacity(stale.len());
        for name in stale {
            LOGGER.info(format!("Deleting old cache {name}"));
            if self.caches.delete(&name).await? {
                deleted.push(name);
            }
        }

        if let Err(err) = self.clients.claim().await {
            LOGGER.warn(format!("failed to claim clients: {err}"));
        }
        LOGGER.info("Activated");
        Ok(deleted)
    }
}
