pub const DEFAULT_CACHE_PREFIX: &str = "cool-track";
pub const DEFAULT_CACHE_VERSION: &str = "1.0.0";

/// Same-origin assets that must be available offline once the worker is installed.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "/",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

pub const DEFAULT_OFFLINE_URL: &str = "/offline.html";
