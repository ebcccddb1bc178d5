use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::messaging::constants::DEFAULT_APP_NAME;
use crate::messaging::error::{duplicate_app, invalid_argument, MessagingResult};
use crate::messaging::types::FirebaseConfig;

/// An initialized Firebase app: a name bound to one configuration.
#[derive(Clone, Debug)]
pub struct FirebaseApp {
    inner: Arc<FirebaseAppInner>,
}

#[derive(Debug)]
struct FirebaseAppInner {
    name: String,
    options: FirebaseConfig,
}

impl FirebaseApp {
    fn new(name: String, options: FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(FirebaseAppInner { name, options }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &FirebaseConfig {
        &self.inner.options
    }

    /// `true` when both handles refer to the same initialized app.
    pub fn ptr_eq(&self, other: &FirebaseApp) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// The apps initialized in one worker.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: Mutex<BTreeMap<String, FirebaseApp>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the default app.
    ///
    /// Calling again with identical options returns the existing app; different options
    /// fail with `messaging/duplicate-app`.
    pub fn initialize_app(&self, options: FirebaseConfig) -> MessagingResult<FirebaseApp> {
        if options.is_empty() {
            return Err(invalid_argument(
                "Need to provide options to initialize a Firebase app",
            ));
        }

        let mut apps = self.apps.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Some(existing) = apps.get(DEFAULT_APP_NAME) {
            if existing.options() == &options {
                return Ok(existing.clone());
            }
            return Err(duplicate_app(DEFAULT_APP_NAME));
        }

        let app = FirebaseApp::new(DEFAULT_APP_NAME.to_string(), options);
        apps.insert(DEFAULT_APP_NAME.to_string(), app.clone());
        Ok(app)
    }

    pub fn get_app(&self) -> Option<FirebaseApp> {
        self.apps
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(DEFAULT_APP_NAME)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.apps
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::error::MessagingErrorCode;

    fn options(project: &str) -> FirebaseConfig {
        FirebaseConfig {
            project_id: Some(project.into()),
            ..Default::default()
        }
    }

    #[test]
    fn same_options_return_same_instance() {
        let registry = AppRegistry::new();
        let first = registry.initialize_app(options("cool-track")).unwrap();
        let second = registry.initialize_app(options("cool-track")).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(first.name(), DEFAULT_APP_NAME);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn different_options_fail() {
        let registry = AppRegistry::new();
        registry.initialize_app(options("cool-track")).unwrap();
        let err = registry.initialize_app(options("other")).unwrap_err();
        assert_eq!(err.code, MessagingErrorCode::DuplicateApp);
    }

    #[test]
    fn empty_options_are_rejected() {
        let registry = AppRegistry::new();
        let err = registry
            .initialize_app(FirebaseConfig::default())
            .unwrap_err();
        assert_eq!(err.code, MessagingErrorCode::InvalidArgument);
        assert!(registry.is_empty());
    }
}
