//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use triage_classifiers::PipelineConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors_permissive: bool,

    /// Model artifacts and pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ServerConfig {
    /// Load configuration from a YAML file, or use defaults if it does not exist
    pub fn load(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = config_path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, listen: Option<String>, port: Option<u16>) -> Self {
        if let Some(listen) = listen {
            self.listen = listen;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            cors_permissive: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}
