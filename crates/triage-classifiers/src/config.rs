//! Configuration for the prediction pipeline and its artifacts

use crate::artifact_store::FsArtifactStore;
use crate::registry::ArtifactNaming;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use triage_core::{Error, Result};

/// Locations and conventions for every artifact the pipeline consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Fitted category classifier
    #[serde(default = "default_category_model")]
    pub category_model: PathBuf,

    /// Fitted shared vectorizer
    #[serde(default = "default_vectorizer")]
    pub vectorizer: PathBuf,

    /// Directory holding per-category risk artifacts
    #[serde(default = "default_risk_models_dir")]
    pub risk_models_dir: PathBuf,

    /// File extension of risk artifacts, without the dot
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    #[serde(default = "default_kmeans_suffix")]
    pub kmeans_suffix: String,

    #[serde(default = "default_risk_map_suffix")]
    pub risk_map_suffix: String,

    /// Categories whose risk models are loaded at startup
    #[serde(default)]
    pub preload: Vec<String>,

    /// Log every request served while the core models are unavailable
    #[serde(default = "default_true")]
    pub log_degraded_requests: bool,
}

fn default_category_model() -> PathBuf {
    PathBuf::from("models/category_model.json")
}

fn default_vectorizer() -> PathBuf {
    PathBuf::from("models/tfidf.json")
}

fn default_risk_models_dir() -> PathBuf {
    PathBuf::from("risk_models")
}

fn default_artifact_extension() -> String {
    "json".to_string()
}

fn default_kmeans_suffix() -> String {
    "_kmeans".to_string()
}

fn default_risk_map_suffix() -> String {
    "_risk_map".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            category_model: default_category_model(),
            vectorizer: default_vectorizer(),
            risk_models_dir: default_risk_models_dir(),
            artifact_extension: default_artifact_extension(),
            kmeans_suffix: default_kmeans_suffix(),
            risk_map_suffix: default_risk_map_suffix(),
            preload: Vec::new(),
            log_degraded_requests: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured naming convention can address artifacts
    pub fn validate(&self) -> Result<()> {
        if self.kmeans_suffix.is_empty() || self.risk_map_suffix.is_empty() {
            return Err(Error::config("artifact suffixes must not be empty"));
        }
        if self.kmeans_suffix == self.risk_map_suffix {
            return Err(Error::config(
                "kmeans_suffix and risk_map_suffix must differ",
            ));
        }
        if self.artifact_extension.starts_with('.') {
            return Err(Error::config(
                "artifact_extension must not start with a dot",
            ));
        }
        Ok(())
    }

    pub fn naming(&self) -> ArtifactNaming {
        ArtifactNaming {
            kmeans_suffix: self.kmeans_suffix.clone(),
            risk_map_suffix: self.risk_map_suffix.clone(),
        }
    }

    /// Artifact store over `risk_models_dir`
    pub fn artifact_store(&self) -> FsArtifactStore {
        FsArtifactStore::new(&self.risk_models_dir, &self.artifact_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = PipelineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.naming(), ArtifactNaming::default());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
category_model: /srv/models/category.json
vectorizer: /srv/models/tfidf.json
risk_models_dir: /srv/risk
preload:
  - Noise Complaint
  - Fire
log_degraded_requests: false
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.risk_models_dir, PathBuf::from("/srv/risk"));
        assert_eq!(config.preload.len(), 2);
        assert!(!config.log_degraded_requests);
        assert_eq!(
            config.artifact_store().path_for("fire_kmeans"),
            PathBuf::from("/srv/risk/fire_kmeans.json")
        );
    }

    #[test]
    fn test_rejects_identical_suffixes() {
        let yaml = "kmeans_suffix: _model\nrisk_map_suffix: _model\n";
        assert!(PipelineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "artifact_extension: bin\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.artifact_extension, "bin");
    }
}
