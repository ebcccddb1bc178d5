//! Network transport used by the fetch handler, the cache installer and the messaging
//! config loader.

#[cfg(not(target_arch = "wasm32"))]
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
#[cfg(not(target_arch = "wasm32"))]
use reqwest::Client;
#[cfg(not(target_arch = "wasm32"))]
use url::Url;

#[cfg(not(target_arch = "wasm32"))]
use crate::fetch::error::{body_read_failed, internal_error, invalid_request, unreachable};
use crate::fetch::error::NetworkResult;
use crate::fetch::types::{Request, Response};

/// Issues requests on behalf of the worker.
///
/// Implementations return `Err` only when no response was obtained at all. A response
/// with a non-2xx status is still `Ok`; callers decide what a bad status means to them.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> NetworkResult<Response>;
}

/// `reqwest` transport resolving relative request URLs against the site origin.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpNetwork {
    pub fn new(origin: &str) -> NetworkResult<Self> {
        Self::with_client(Client::new(), origin)
    }

    pub fn with_client(client: Client, origin: &str) -> NetworkResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|err| invalid_request(format!("invalid origin '{origin}': {err}")))?;
        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn resolve(&self, url: &str) -> NetworkResult<Url> {
        self.origin
            .join(url)
            .map_err(|err| invalid_request(format!("cannot resolve '{url}': {err}")))
    }

    fn build_headers(request: &Request) -> NetworkResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| invalid_request(format!("invalid header name '{name}': {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| invalid_request(format!("invalid header value: {err}")))?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> NetworkResult<Response> {
        let url = self.resolve(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|err| internal_error(format!("unsupported method: {err}")))?;
        let headers = Self::build_headers(request)?;

        let response = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|err| unreachable(format!("{} {url} failed: {err}", request.method)))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|err| body_read_failed(format!("reading body of {url} failed: {err}")))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            url: final_url,
        })
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::fetch::error::NetworkErrorCode;
    use httpmock::prelude::*;

    #[tokio::test(flavor = "current_thread")]
    async fn resolves_relative_urls_against_origin() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/manifest.json").header("accept", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body("{\"name\":\"Cool Track\"}");
        });

        let network = HttpNetwork::new(&server.base_url()).unwrap();
        let response = network
            .fetch(&Request::get("/manifest.json").with_header("Accept", "application/json"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.text(), "{\"name\":\"Cool Track\"}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn error_statuses_are_responses() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("nope");
        });

        let network = HttpNetwork::new(&server.base_url()).unwrap();
        let response = network.fetch(&Request::get("/missing")).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.ok());
        assert_eq!(response.status_text, "Not Found");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreachable_host_is_an_error() {
        let network = HttpNetwork::new("http://127.0.0.1:9").unwrap();
        let err = network.fetch(&Request::get("/")).await.unwrap_err();
        assert_eq!(err.code, NetworkErrorCode::Unreachable);
    }

    #[test]
    fn rejects_invalid_origin() {
        let err = HttpNetwork::new("not a url").unwrap_err();
        assert_eq!(err.code_str(), "fetch/invalid-request");
    }
}
