use serde::{Deserialize, Serialize};

use crate::cache::constants::{DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_VERSION};

/// Names of the cache generations owned by one worker version.
///
/// A generation name embeds the version tag, so bumping the version makes every
/// generation of the previous deploy unreserved and eligible for eviction on activate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    pub prefix: String,
    pub version: String,
}

impl Default for CacheNames {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_VERSION)
    }
}

impl CacheNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    /// Name used by earlier workers that kept a single cache; still reserved so that
    /// pages relying on it keep working across the upgrade.
    pub fn legacy(&self) -> String {
        format!("{}-v{}", self.prefix, self.version)
    }

    pub fn static_name(&self) -> String {
        format!("{}-static-v{}", self.prefix, self.version)
    }

    pub fn dynamic_name(&self) -> String {
        format!("{}-dynamic-v{}", self.prefix, self.version)
    }

    pub fn reserved(&self) -> [String; 3] {
        [self.static_name(), self.dynamic_name(), self.legacy()]
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved().iter().any(|reserved| reserved == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_embed_version() {
        let names = CacheNames::default();
        assert_eq!(names.static_name(), "cool-track-static-v1.0.0");
        assert_eq!(names.dynamic_name(), "cool-track-dynamic-v1.0.0");
        assert_eq!(names.legacy(), "cool-track-v1.0.0");
    }

    #[test]
    fn older_generations_are_not_reserved() {
        let names = CacheNames::new("cool-track", "1.1.0");
        assert!(names.is_reserved("cool-track-dynamic-v1.1.0"));
        assert!(!names.is_reserved("cool-track-dynamic-v1.0.0"));
        assert!(!names.is_reserved("cool-track-static-v1.1.0-old"));
    }
}
