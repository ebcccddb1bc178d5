use std::sync::Arc;

use crate::fetch::{Network, Request};
use crate::messaging::constants::DEFAULT_CONFIG_ENDPOINT;
use crate::messaging::error::{config_fetch_failed, MessagingResult};
use crate::messaging::logger::LOGGER;
use crate::messaging::types::{ConfigEnvelope, FirebaseConfig};

/// Where the worker obtains its Firebase configuration when no page has posted one.
#[cfg_attr(
    all(feature = "wasm-web", target_arch = "wasm32"),
    async_trait::async_trait(?Send)
)]
#[cfg_attr(
    not(all(feature = "wasm-web", target_arch = "wasm32")),
    async_trait::async_trait
)]
pub trait ConfigSource: Send + Sync {
    async fn load(&self) -> MessagingResult<FirebaseConfig>;
}

/// Loads `{"config": {...}}` from a same-origin endpoint.
pub struct HttpConfigSource {
    network: Arc<dyn Network>,
    endpoint: String,
}

impl HttpConfigSource {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self::with_endpoint(network, DEFAULT_CONFIG_ENDPOINT)
    }

    pub fn with_endpoint(network: Arc<dyn Network>, endpoint: impl Into<String>) -> Self {
        Self {
            network,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
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
impl ConfigSource for HttpConfigSource {
    async fn load(&self) -> MessagingResult<FirebaseConfig> {
        LOGGER.debug(format!("Fetching Firebase config from {}", self.endpoint));
        let response = self
            .network
            .fetch(&Request::get(self.endpoint.as_str()))
            .await
            .map_err(|err| config_fetch_failed(format!("Failed to fetch Firebase config: {err}")))?;

        if !response.ok() {
            return Err(config_fetch_failed(format!(
                "Failed to fetch config, status: {} ({})",
                response.status,
                response.text()
            )));
        }

        let envelope: ConfigEnvelope = response
            .json()
            .map_err(|err| config_fetch_failed(format!("Invalid config response: {err}")))?;
        match envelope.config {
            Some(config) if !config.is_empty() => Ok(config),
            _ => Err(config_fetch_failed("Config response carried no config")),
        }
    }
}

/// Config known ahead of time, e.g. compiled into the worker.
#[derive(Clone, Debug)]
pub struct StaticConfigSource {
    config: FirebaseConfig,
}

impl StaticConfigSource {
    pub fn new(config: FirebaseConfig) -> Self {
        Self { config }
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
impl ConfigSource for StaticConfigSource {
    async fn load(&self) -> MessagingResult<FirebaseConfig> {
        Ok(self.config.clone())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::fetch::HttpNetwork;
    use crate::logger::test_capture::serialize;
    use crate::logger::{LogLevel, Logger};
    use crate::messaging::error::MessagingErrorCode;
    use httpmock::prelude::*;

    fn source(server: &MockServer) -> HttpConfigSource {
        HttpConfigSource::new(Arc::new(HttpNetwork::new(&server.base_url()).unwrap()))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn loads_config_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/get_config");
            then.status(200).json_body(serde_json::json!({
                "config": {
                    "apiKey": "key",
                    "projectId": "cool-track",
                    "appId": "1:42:web:abc",
                    "messagingSenderId": "42",
                    "databaseURL": "https://cool-track.firebaseio.com"
                }
            }));
        });

        let config = source(&server).load().await.unwrap();

        mock.assert();
        assert_eq!(config.project_id.as_deref(), Some("cool-track"));
        assert_eq!(config.messaging_sender_id.as_deref(), Some("42"));
        assert_eq!(
            config.database_url.as_deref(),
            Some("https://cool-track.firebaseio.com")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn error_status_is_a_fetch_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/get_config");
            then.status(500).body("boom");
        });

        let err = source(&server).load().await.unwrap_err();
        assert_eq!(err.code, MessagingErrorCode::ConfigFetchFailed);
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_config_field_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/get_config");
            then.status(200).json_body(serde_json::json!({"config": null}));
        });

        let err = source(&server).load().await.unwrap_err();
        assert_eq!(err.code, MessagingErrorCode::ConfigFetchFailed);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_is_logged_under_the_messaging_logger() {
        let _guard = serialize();
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        LOGGER.set_log_level(LogLevel::Debug);
        LOGGER.set_user_log_handler(Some(move |logger: &Logger, _: LogLevel, message: &str| {
            sink.lock()
                .unwrap()
                .push((logger.name().to_owned(), message.to_owned()));
        }));

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/get_config");
            then.status(404);
        });
        source(&server).load().await.unwrap_err();
        LOGGER.clear_user_log_handler();

        let records = records.lock().unwrap();
        assert!(records.contains(&(
            "@cooltrack/messaging".to_string(),
            "Fetching Firebase config from /get_config".to_string()
        )));
    }
}
