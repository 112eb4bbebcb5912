//! Triage Classifiers
//!
//! Two-stage inference for free-text incident reports.
//!
//! - Stage one: a shared category classifier assigns an incident category
//! - Stage two: the category's cluster model maps the same text to a risk
//!   bucket, resolved lazily from an artifact store and cached per category
//!
//! Categories without risk artifacts degrade to an `Unknown` risk. All
//! models are fitted elsewhere; this crate only loads and runs them.

pub mod artifact_store;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod pipeline;
pub mod registry;
pub mod risk_map;
pub mod telemetry;
pub mod vectorizer;

pub use artifact_store::{ArtifactStore, FsArtifactStore};
pub use classifier::{CategoryClassifier, LinearCategoryClassifier, LinearClassifierArtifact};
pub use cluster::{ClusterModel, KMeansArtifact, KMeansModel};
pub use config::PipelineConfig;
pub use pipeline::{Outcome, PipelineContext, PipelineState, Prediction};
pub use registry::{ArtifactNaming, RegistryStats, Resolution, RiskModel, RiskModelRegistry};
pub use risk_map::RiskLabelMap;
pub use vectorizer::{Norm, TfidfArtifact, TfidfVectorizer, Vectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::CategoryClassifier;
    pub use crate::cluster::ClusterModel;
    pub use crate::pipeline::{Outcome, PipelineContext};
    pub use crate::registry::RiskModelRegistry;
    pub use crate::vectorizer::Vectorizer;
    pub use triage_core::{PredictionResult, MODEL_NOT_LOADED, UNKNOWN};
}
