//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

use uplift_core::ModelSettings;

use crate::config::ServerConfig;
use crate::registry::RuntimeRegistry;
use crate::runtime::ModelRuntime;

/// State shared by every route handler
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// The single model runtime being served
    pub runtime: Arc<dyn ModelRuntime>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// State around an already constructed runtime
    pub fn new(config: ServerConfig, runtime: Arc<dyn ModelRuntime>, metrics_handle: Option<PrometheusHandle>) -> Self {
        Self {
            config: Arc::new(config),
            runtime,
            metrics_handle,
        }
    }

    /// Read the model settings, build the runtime they name, and initialize
    /// it. Any failure here aborts startup.
    pub async fn initialize(
        config: ServerConfig,
        registry: &RuntimeRegistry,
        metrics_handle: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let settings = ModelSettings::load(&config.settings_path)?;
        info!(
            "Model settings from {}: name={}, implementation={}, uri={}",
            config.settings_path.display(),
            settings.name,
            settings.implementation,
            settings.parameters.uri
        );

        let runtime = registry.create(settings, &config.settings_dir())?;
        runtime.initialize().await?;

        Ok(Self::new(config, runtime, metrics_handle))
    }
}
