use std::sync::Arc;

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::cache::error::{delete_failed, open_failed, read_failed, write_failed, CacheResult};
use crate::cache::{Cache, CacheStorage};
use crate::fetch::{Request, Response};
use crate::platform::browser::network::{from_web_response, to_web_request, to_web_response};
use crate::platform::browser::{format_js_error, worker_global};

fn storage() -> CacheResult<web_sys::CacheStorage> {
    let global = worker_global().ok_or_else(|| open_failed("not running in a service worker"))?;
    global
        .caches()
        .map_err(|err| open_failed(format_js_error("caches", err)))
}

async fn open_web_cache(name: &str) -> CacheResult<web_sys::Cache> {
    let value = JsFuture::from(storage()?.open(name))
        .await
        .map_err(|err| open_failed(format_js_error("caches.open", err)))?;
    value
        .dyn_into()
        .map_err(|_| open_failed(format!("caches.open({name}) returned a non-Cache value")))
}

async fn matched(promise: js_sys::Promise) -> CacheResult<Option<Response>> {
    let value = JsFuture::from(promise)
        .await
        .map_err(|err| read_failed(format_js_error("match", err)))?;
    if value.is_undefined() {
        return Ok(None);
    }
    let response: web_sys::Response = value
        .dyn_into()
        .map_err(|_| read_failed("match resolved to a non-Response value"))?;
    from_web_response(&response)
        .await
        .map(Some)
        .map_err(|err| read_failed(format_js_error("Response.arrayBuffer", err)))
}

fn web_request(request: &Request) -> CacheResult<web_sys::Request> {
    to_web_request(request).map_err(|err| read_failed(format_js_error("new Request", err)))
}

/// `self.caches`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserCacheStorage;

impl BrowserCacheStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl CacheStorage for BrowserCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn Cache>> {
        open_web_cache(name).await?;
        Ok(Arc::new(BrowserCache {
            name: name.to_string(),
        }))
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        let value = JsFuture::from(storage()?.has(name))
            .await
            .map_err(|err| read_failed(format_js_error("caches.has", err)))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let value = JsFuture::from(storage()?.keys())
            .await
            .map_err(|err| read_failed(format_js_error("caches.keys", err)))?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let value = JsFuture::from(storage()?.delete(name))
            .await
            .map_err(|err| delete_failed(format_js_error("caches.delete", err)))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        matched(storage()?.match_with_request(&web_request(request)?)).await
    }
}

/// One named cache, reopened on every call.
#[derive(Clone, Debug)]
pub struct BrowserCache {
    name: String,
}

#[async_trait::async_trait(?Send)]
impl Cache for BrowserCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, request: &Request, response: Response) -> CacheResult<()> {
        let cache = open_web_cache(&self.name).await?;
        let js_request = to_web_request(request)
            .map_err(|err| write_failed(format_js_error("new Request", err)))?;
        let js_response = to_web_response(&response)
            .map_err(|err| write_failed(format_js_error("new Response", err)))?;
        JsFuture::from(cache.put_with_request(&js_request, &js_response))
            .await
            .map_err(|err| write_failed(format_js_error("cache.put", err)))?;
        Ok(())
    }

    async fn match_request(&self, request: &Request) -> CacheResult<Option<Response>> {
        let cache = open_web_cache(&self.name).await?;
        matched(cache.match_with_request(&web_request(request)?)).await
    }

    async fn delete(&self, request: &Request) -> CacheResult<bool> {
        let cache = open_web_cache(&self.name).await?;
        let value = JsFuture::from(cache.delete_with_request(&web_request(request)?))
            .await
            .map_err(|err| delete_failed(format_js_error("cache.delete", err)))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let cache = open_web_cache(&self.name).await?;
        let value = JsFuture::from(cache.keys())
            .await
            .map_err(|err| read_failed(format_js_error("cache.keys", err)))?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|entry| entry.dyn_into::<web_sys::Request>().ok())
            .map(|request| request.url())
            .collect())
    }
}
