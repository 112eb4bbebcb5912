//! Storage for per-category risk artifacts.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use triage_core::{Error, Result};

/// Read-only store of named artifacts.
///
/// The registry only ever asks whether an artifact exists and for its raw
/// bytes; decoding happens above this layer.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact with this name exists
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Read the full contents of an artifact
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}

/// Artifacts stored as `{root}/{name}.{extension}` on the local filesystem
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    extension: String,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an artifact name resolves to
    pub fn path_for(&self, name: &str) -> PathBuf {
        if self.extension.is_empty() {
            self.root.join(name)
        } else {
            self.root.join(format!("{}.{}", name, self.extension))
        }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, name: &str) -> Result<bool> {
        match tokio::fs::metadata(self.path_for(name)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => Ok(bytes),
            // Removed between the existence check and the read
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::artifact_missing(name)),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exists_and_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fire_kmeans.json"), b"{}").unwrap();

        let store = FsArtifactStore::new(dir.path(), "json");
        assert!(store.exists("fire_kmeans").await.unwrap());
        assert!(!store.exists("fire_risk_map").await.unwrap());
        assert_eq!(store.read("fire_kmeans").await.unwrap(), b"{}");

        let err = store.read("fire_risk_map").await.unwrap_err();
        assert!(matches!(err, Error::ArtifactMissing(_)));
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let store = FsArtifactStore::new("/nonexistent/risk_models", "json");
        assert!(!store.exists("fire_kmeans").await.unwrap());
    }

    #[tokio::test]
    async fn test_directories_are_not_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fire_kmeans")).unwrap();

        let store = FsArtifactStore::new(dir.path(), "");
        assert!(!store.exists("fire_kmeans").await.unwrap());
    }

    #[test]
    fn test_path_for() {
        let store = FsArtifactStore::new("risk_models", "json");
        assert_eq!(
            store.path_for("noise_complaint_kmeans"),
            PathBuf::from("risk_models/noise_complaint_kmeans.json")
        );
    }
}
