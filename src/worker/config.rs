use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::constants::{
    DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_VERSION, DEFAULT_OFFLINE_URL, DEFAULT_STATIC_ASSETS,
};
use crate::cache::CacheNames;
use crate::messaging::constants::{
    DEFAULT_CONFIG_ENDPOINT, DEFAULT_MAX_SETUP_ATTEMPTS, DEFAULT_SETUP_RETRY_INTERVAL,
};
use crate::messaging::SetupPolicy;
use crate::push::NotificationDefaults;
use crate::worker::error::{invalid_config, WorkerResult};

pub const DEFAULT_UPDATE_POLL_INTERVAL_MS: u64 = 60_000;

/// Everything a worker build needs to know up front.
///
/// Deserializes from camelCase JSON; missing fields take the app shell values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    pub cache_prefix: String,
    pub cache_version: String,
    /// Populates and serves the cache generations. When off, install does no caching and
    /// fetch events are left to the network.
    pub caching: bool,
    pub static_assets: Vec<String>,
    pub offline_url: Option<String>,
    /// Calls `skipWaiting` as soon as install succeeds.
    pub skip_waiting_on_install: bool,
    /// Runs the Firebase messaging bridge.
    pub messaging: bool,
    pub config_endpoint: String,
    pub max_setup_attempts: u32,
    pub setup_retry_interval_ms: u64,
    pub update_poll_interval_ms: u64,
    pub notifications: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::app_shell()
    }
}

impl WorkerConfig {
    /// The installable app worker: offline caching and app notification defaults.
    pub fn app_shell() -> Self {
        Self {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            caching: true,
            static_assets: DEFAULT_STATIC_ASSETS.iter().map(|url| url.to_string()).collect(),
            offline_url: Some(DEFAULT_OFFLINE_URL.to_string()),
            skip_waiting_on_install: true,
            messaging: false,
            config_endpoint: DEFAULT_CONFIG_ENDPOINT.to_string(),
            max_setup_attempts: DEFAULT_MAX_SETUP_ATTEMPTS,
            setup_retry_interval_ms: DEFAULT_SETUP_RETRY_INTERVAL.as_millis() as u64,
            update_poll_interval_ms: DEFAULT_UPDATE_POLL_INTERVAL_MS,
            notifications: NotificationDefaults::app_shell(),
        }
    }

    /// The Firebase messaging worker: no caching, notifications shown as pushed.
    pub fn messaging() -> Self {
        Self {
            caching: false,
            static_assets: Vec::new(),
            offline_url: None,
            skip_waiting_on_install: false,
            messaging: true,
            notifications: NotificationDefaults::default(),
            ..Self::app_shell()
        }
    }

    pub fn from_json(json: &str) -> WorkerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| invalid_config(format!("invalid worker config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.cache_prefix.is_empty() || self.cache_version.is_empty() {
            return Err(invalid_config("cache prefix and version must not be empty"));
        }
        if self.messaging && self.max_setup_attempts == 0 {
            return Err(invalid_config("maxSetupAttempts must be at least 1"));
        }
        if self.messaging && !self.config_endpoint.starts_with('/') {
            return Err(invalid_config(format!(
                "config endpoint '{}' must be a same-origin path",
                self.config_endpoint
            )));
        }
        Ok(())
    }

    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(self.cache_prefix.clone(), self.cache_version.clone())
    }

    pub fn setup_policy(&self) -> SetupPolicy {
        SetupPolicy {
            max_attempts: self.max_setup_attempts,
            retry_interval: Duration::from_millis(self.setup_retry_interval_ms),
        }
    }

    pub fn update_poll_interval(&self) -> Duration {
        Duration::from_millis(self.update_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::error::WorkerErrorCode;

    #[test]
    fn app_shell_matches_deployed_worker() {
        let config = WorkerConfig::default();
        assert_eq!(config.cache_names().static_name(), "cool-track-static-v1.0.0");
        assert_eq!(config.static_assets.len(), 4);
        assert_eq!(config.offline_url.as_deref(), Some("/offline.html"));
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.notifications.tag.as_deref(), Some("general"));
    }

    #[test]
    fn messaging_preset_disables_caching() {
        let config = WorkerConfig::messaging();
        assert!(!config.caching);
        assert!(config.messaging);
        assert_eq!(config.setup_policy(), SetupPolicy::default());
        assert!(config.notifications.title.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            WorkerConfig::from_json(r#"{"cacheVersion":"2.0.0","updatePollIntervalMs":5000}"#)
                .unwrap();
        assert_eq!(config.cache_names().legacy(), "cool-track-v2.0.0");
        assert_eq!(config.update_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.cache_prefix, "cool-track");
    }

    #[test]
    fn rejects_cross_origin_endpoint() {
        let err = WorkerConfig::from_json(
            r#"{"messaging":true,"configEndpoint":"https://evil.example/get_config"}"#,
        )
        .unwrap_err();
        assert_eq!(err.code, WorkerErrorCode::InvalidConfig);
    }
}
