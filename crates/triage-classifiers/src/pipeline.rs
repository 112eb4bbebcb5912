//! Two-stage prediction pipeline
//!
//! Stage one assigns a category with the shared classifier. Stage two looks
//! up the category's risk model and clusters the same text into a risk
//! bucket. Every failure is resolved here: callers always get a category and
//! risk pair back, never an error.
//!
//! The pipeline is either `Ready` or `Degraded` for its whole lifetime. A
//! degraded pipeline answers every non-blank request with the
//! `Model not loaded` sentinel.

use crate::classifier::{CategoryClassifier, LinearCategoryClassifier};
use crate::config::PipelineConfig;
use crate::registry::{Resolution, RiskModelRegistry};
use crate::telemetry;
use crate::vectorizer::{TfidfVectorizer, Vectorizer};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use triage_core::{Error, FaultKind, PredictionResult, Result};

/// Load state of the core models, fixed at construction
#[derive(Clone)]
pub enum PipelineState {
    /// Classifier and vectorizer are loaded
    Ready {
        classifier: Arc<dyn CategoryClassifier>,
        vectorizer: Arc<dyn Vectorizer>,
    },

    /// Core models failed to load
    Degraded { reason: String },
}

impl PipelineState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Degraded { .. } => "degraded",
        }
    }
}

/// How a prediction was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Category and risk both came from models
    Classified,
    /// Text was missing or blank
    EmptyInput,
    /// Core models unavailable
    Degraded,
    /// No risk artifacts for the category
    NoRiskModel,
    /// Risk artifacts exist but failed to load or run
    RiskModelFailed,
    /// The cluster id has no entry in the risk map
    UnmappedCluster,
    /// Anything else went wrong
    InternalFault,
}

impl Outcome {
    /// Stable name used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::EmptyInput => "empty_input",
            Self::Degraded => "degraded",
            Self::NoRiskModel => "no_risk_model",
            Self::RiskModelFailed => "risk_model_failed",
            Self::UnmappedCluster => "unmapped_cluster",
            Self::InternalFault => "internal_fault",
        }
    }

    /// Fault behind this outcome, if any
    pub fn fault(&self) -> Option<FaultKind> {
        match self {
            Self::Classified | Self::UnmappedCluster => None,
            Self::EmptyInput => Some(FaultKind::InputEmpty),
            Self::Degraded => Some(FaultKind::ModelUnavailable),
            Self::NoRiskModel => Some(FaultKind::ArtifactMissing),
            Self::RiskModelFailed => Some(FaultKind::ArtifactCorrupt),
            Self::InternalFault => Some(FaultKind::InternalFault),
        }
    }
}

/// Prediction with the diagnostics callers do not see
#[derive(Debug, Clone)]
pub struct Prediction {
    pub result: PredictionResult,
    pub outcome: Outcome,
    pub latency_us: u64,
}

/// Owns the classifier, vectorizer, and risk model registry
pub struct PipelineContext {
    state: PipelineState,
    registry: Arc<RiskModelRegistry>,
    log_degraded_requests: bool,
}

impl PipelineContext {
    /// Create a ready pipeline from loaded models
    pub fn ready(
        classifier: Arc<dyn CategoryClassifier>,
        vectorizer: Arc<dyn Vectorizer>,
        registry: Arc<RiskModelRegistry>,
    ) -> Self {
        Self {
            state: PipelineState::Ready {
                classifier,
                vectorizer,
            },
            registry,
            log_degraded_requests: true,
        }
    }

    /// Create a pipeline whose core models are unavailable
    pub fn degraded(reason: impl Into<String>, registry: Arc<RiskModelRegistry>) -> Self {
        Self {
            state: PipelineState::Degraded {
                reason: reason.into(),
            },
            registry,
            log_degraded_requests: true,
        }
    }

    /// Enable or disable the per-request warning in degraded mode
    pub fn with_degraded_logging(mut self, enabled: bool) -> Self {
        self.log_degraded_requests = enabled;
        self
    }

    /// Load the core models named by the configuration.
    ///
    /// Never fails: if either model cannot be loaded the pipeline starts
    /// degraded and the cause is logged once here.
    pub fn load(config: &PipelineConfig) -> Self {
        let registry = RiskModelRegistry::new(Arc::new(config.artifact_store()))
            .with_naming(config.naming());

        let context = match Self::load_models(config) {
            Ok((classifier, vectorizer)) => {
                info!(
                    "Loaded category classifier '{}' with {} labels, vectorizer dimension {}",
                    classifier.name(),
                    classifier.labels().len(),
                    vectorizer.dimension()
                );
                let registry = registry.with_expected_dimension(vectorizer.dimension());
                Self::ready(classifier, vectorizer, Arc::new(registry))
            }
            Err(e) => {
                error!("Core models failed to load, serving degraded predictions: {}", e);
                Self::degraded(e.to_string(), Arc::new(registry))
            }
        };

        context.with_degraded_logging(config.log_degraded_requests)
    }

    /// Load the core models and preload configured risk models.
    ///
    /// Fails only when a preloaded risk model is broken or was fitted
    /// against a different feature dimension.
    pub async fn initialize(config: &PipelineConfig) -> Result<Self> {
        let context = Self::load(config);

        if context.state.is_ready() && !config.preload.is_empty() {
            let loaded = context.registry.preload(&config.preload).await?;
            info!(
                "Preloaded {}/{} risk models",
                loaded,
                config.preload.len()
            );
        }

        Ok(context)
    }

    fn load_models(
        config: &PipelineConfig,
    ) -> Result<(Arc<dyn CategoryClassifier>, Arc<dyn Vectorizer>)> {
        let vectorizer: Arc<dyn Vectorizer> =
            Arc::new(TfidfVectorizer::from_file(&config.vectorizer)?);
        let classifier =
            LinearCategoryClassifier::from_file(&config.category_model, Arc::clone(&vectorizer))?;
        Ok((Arc::new(classifier), vectorizer))
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn registry(&self) -> &Arc<RiskModelRegistry> {
        &self.registry
    }

    /// Label text with a category and risk level
    pub async fn classify(&self, text: &str) -> PredictionResult {
        self.classify_detailed(text).await.result
    }

    /// Label text and report how the labels were reached
    pub async fn classify_detailed(&self, text: &str) -> Prediction {
        let start = Instant::now();
        let (result, outcome) = self.predict(text).await;
        let latency_us = start.elapsed().as_micros() as u64;

        metrics::counter!(telemetry::PREDICTIONS_TOTAL, "outcome" => outcome.as_str())
            .increment(1);
        metrics::histogram!(telemetry::CLASSIFY_LATENCY_US).record(latency_us as f64);

        Prediction {
            result,
            outcome,
            latency_us,
        }
    }

    async fn predict(&self, text: &str) -> (PredictionResult, Outcome) {
        if text.trim().is_empty() {
            return (PredictionResult::unknown(), Outcome::EmptyInput);
        }

        let (classifier, vectorizer) = match &self.state {
            PipelineState::Ready {
                classifier,
                vectorizer,
            } => (classifier.as_ref(), vectorizer.as_ref()),
            PipelineState::Degraded { reason } => {
                if self.log_degraded_requests {
                    warn!("Serving degraded prediction: {}", reason);
                }
                return (PredictionResult::model_not_loaded(), Outcome::Degraded);
            }
        };

        let inference = AssertUnwindSafe(self.infer(classifier, vectorizer, text));
        match inference.catch_unwind().await {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(e)) if e.kind() == FaultKind::ModelUnavailable => {
                warn!("Category classifier unavailable: {}", e);
                (PredictionResult::model_not_loaded(), Outcome::Degraded)
            }
            Ok(Err(e)) => {
                error!("Classification failed ({}): {:?}", e.kind().as_str(), e);
                (PredictionResult::unknown(), Outcome::InternalFault)
            }
            Err(panic) => {
                error!("Classification panicked: {}", panic_message(panic.as_ref()));
                (PredictionResult::unknown(), Outcome::InternalFault)
            }
        }
    }

    async fn infer(
        &self,
        classifier: &dyn CategoryClassifier,
        vectorizer: &dyn Vectorizer,
        text: &str,
    ) -> Result<(PredictionResult, Outcome)> {
        let category = classifier.categorize(text).await?;
        if category.trim().is_empty() {
            return Err(Error::internal(format!(
                "classifier '{}' returned a blank category",
                classifier.name()
            )));
        }

        let model = match self.registry.lookup(&category).await {
            Resolution::Hit(model) => model,
            Resolution::Missing => {
                return Ok((PredictionResult::unknown_risk(category), Outcome::NoRiskModel))
            }
            Resolution::Failed(_) => {
                return Ok((
                    PredictionResult::unknown_risk(category),
                    Outcome::RiskModelFailed,
                ))
            }
        };

        let features = vectorizer.transform(text);
        let cluster = match model.cluster(&features) {
            Ok(cluster) => cluster,
            Err(e) => {
                warn!("Risk model for '{}' failed to cluster: {}", model.key(), e);
                return Ok((
                    PredictionResult::unknown_risk(category),
                    Outcome::RiskModelFailed,
                ));
            }
        };

        match model.risk_map().get(cluster) {
            Some(risk) => {
                let risk = risk.to_string();
                Ok((PredictionResult::new(category, risk), Outcome::Classified))
            }
            None => {
                debug!("Cluster {} of '{}' has no risk label", cluster, model.key());
                Ok((
                    PredictionResult::unknown_risk(category),
                    Outcome::UnmappedCluster,
                ))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
