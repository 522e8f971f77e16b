//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Inference host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model settings file naming the artifact to serve
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Name reported by `GET /v2`
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(settings) = &cli.settings {
            config.settings_path = PathBuf::from(settings);
        }

        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.body_limit_bytes == 0 {
            anyhow::bail!("body_limit_bytes must be greater than zero");
        }
        Ok(config)
    }

    /// `listen:port` as a socket address string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }

    /// Directory relative artifact URIs resolve against
    pub fn settings_dir(&self) -> PathBuf {
        match self.settings_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            settings_path: default_settings_path(),
            body_limit_bytes: default_body_limit(),
            metrics_enabled: true,
            server_name: default_server_name(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_settings_path() -> PathBuf {
    PathBuf::from(uplift_core::settings::SETTINGS_FILE)
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_server_name() -> String {
    "uplift-server".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load("/nonexistent/server.yaml", &Cli::default()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.body_limit_bytes, 1 << 20);
        assert_eq!(config.settings_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(&path, "port: 9000\nlisten: 127.0.0.1\nmetrics_enabled: false\n").unwrap();

        let cli = Cli {
            settings: Some("/srv/models/model-config.json".to_string()),
            port: Some(9100),
            ..Default::default()
        };
        let config = ServerConfig::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.listen, "127.0.0.1");
        assert_eq!(config.port, 9100);
        assert!(!config.metrics_enabled);
        assert_eq!(config.settings_dir(), PathBuf::from("/srv/models"));
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        assert!(ServerConfig::from_yaml("body_limit_bytes: 0").is_err());
    }
}
