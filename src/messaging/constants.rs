use std::time::Duration;

pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Same-origin endpoint answering `{"config": {...}}`.
pub const DEFAULT_CONFIG_ENDPOINT: &str = "/get_config";

pub const DEFAULT_MAX_SETUP_ATTEMPTS: u32 = 10;
pub const DEFAULT_SETUP_RETRY_INTERVAL: Duration = Duration::from_millis(1_000);
