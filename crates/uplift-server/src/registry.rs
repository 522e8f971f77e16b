//! Runtime registry
//!
//! Maps the `implementation` locator of the model settings to a factory
//! that builds the runtime serving it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use uplift_core::settings::RUNTIME_IMPLEMENTATION;
use uplift_core::{Error, ModelSettings, Result};

use crate::runtime::{ModelRuntime, UpliftRuntime};

/// Builds a runtime from settings and the settings file's directory
pub type RuntimeFactory = Arc<dyn Fn(ModelSettings, PathBuf) -> Arc<dyn ModelRuntime> + Send + Sync>;

/// Registry of runtime implementations by locator
pub struct RuntimeRegistry {
    factories: HashMap<String, RuntimeFactory>,
}

impl RuntimeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `implementation`, replacing any previous one
    pub fn register(&mut self, implementation: impl Into<String>, factory: RuntimeFactory) {
        let implementation = implementation.into();
        info!("Registered runtime implementation: {}", implementation);
        self.factories.insert(implementation, factory);
    }

    /// Known implementation locators, sorted
    pub fn implementations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the runtime named by `settings.implementation`
    pub fn create(&self, settings: ModelSettings, settings_dir: &Path) -> Result<Arc<dyn ModelRuntime>> {
        let factory = self.factories.get(&settings.implementation).ok_or_else(|| {
            Error::config(format!(
                "unknown runtime implementation '{}', known: {}",
                settings.implementation,
                self.implementations().join(", ")
            ))
        })?;
        Ok(factory(settings, settings_dir.to_path_buf()))
    }
}

impl Default for RuntimeRegistry {
    /// Registry with the built-in uplift runtime
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(
            RUNTIME_IMPLEMENTATION,
            Arc::new(|settings: ModelSettings, dir: PathBuf| {
                Arc::new(UpliftRuntime::new(settings, dir)) as Arc<dyn ModelRuntime>
            }),
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_builds_uplift_runtime() {
        let registry = RuntimeRegistry::default();
        assert_eq!(registry.implementations(), vec![RUNTIME_IMPLEMENTATION]);

        let runtime = registry
            .create(ModelSettings::for_uri("one_model.json"), Path::new("."))
            .unwrap();
        assert_eq!(runtime.name(), "uplift-predictor");
        assert!(!runtime.is_ready());
    }

    #[test]
    fn test_unknown_implementation() {
        let registry = RuntimeRegistry::default();
        let mut settings = ModelSettings::for_uri("one_model.json");
        settings.implementation = "mlserver_sklearn.SKLearnModel".to_string();

        let err = registry.create(settings, Path::new(".")).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("mlserver_sklearn.SKLearnModel"));
    }
}
