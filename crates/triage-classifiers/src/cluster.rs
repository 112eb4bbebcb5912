//! Cluster models that partition feature vectors

use serde::{Deserialize, Serialize};
use triage_core::{ClusterId, Error, FeatureVector, Result};

/// A fitted unsupervised partitioner.
///
/// Implementations must be deterministic: the same vector always maps to the
/// same cluster for the lifetime of the model.
pub trait ClusterModel: Send + Sync {
    /// Assign a cluster to the feature vector
    fn cluster(&self, features: &FeatureVector) -> Result<ClusterId>;

    /// Feature dimension the model was fitted against
    fn dimension(&self) -> usize;

    /// Number of clusters
    fn n_clusters(&self) -> usize;
}

/// Serialized form of a fitted k-means model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansArtifact {
    pub cluster_centers: Vec<Vec<f32>>,
}

/// Nearest-centroid assignment over fitted k-means centers
#[derive(Debug, Clone)]
pub struct KMeansModel {
    centers: Vec<Vec<f32>>,
    center_norms: Vec<f32>,
    dimension: usize,
}

impl KMeansModel {
    /// Build a model from its artifact, validating shapes
    pub fn from_artifact(name: &str, artifact: KMeansArtifact) -> Result<Self> {
        let centers = artifact.cluster_centers;
        let dimension = match centers.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(Error::artifact_corrupt(name, "no cluster centers")),
        };

        if let Some(pos) = centers.iter().position(|c| c.len() != dimension) {
            return Err(Error::artifact_corrupt(
                name,
                format!(
                    "center {} has {} columns, expected {}",
                    pos,
                    centers[pos].len(),
                    dimension
                ),
            ));
        }

        if centers.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::artifact_corrupt(name, "non-finite center coordinate"));
        }

        let center_norms = centers
            .iter()
            .map(|c| c.iter().map(|v| v * v).sum())
            .collect();

        Ok(Self {
            centers,
            center_norms,
            dimension,
        })
    }

    /// Decode a JSON artifact
    pub fn from_json_slice(name: &str, bytes: &[u8]) -> Result<Self> {
        let artifact: KMeansArtifact =
            serde_json::from_slice(bytes).map_err(|e| Error::artifact_corrupt(name, e))?;
        Self::from_artifact(name, artifact)
    }
}

impl ClusterModel for KMeansModel {
    fn cluster(&self, features: &FeatureVector) -> Result<ClusterId> {
        if features.dimension() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: features.dimension(),
            });
        }

        // ||c - x||^2 = ||c||^2 - 2 c.x + ||x||^2; the last term is shared
        // by every center, so it is left out.
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (idx, (center, norm)) in self.centers.iter().zip(&self.center_norms).enumerate() {
            let distance = norm - 2.0 * features.dot(center);
            if distance < best_distance {
                best = idx;
                best_distance = distance;
            }
        }

        Ok(best)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn n_clusters(&self) -> usize {
        self.centers.len()
    }
}
