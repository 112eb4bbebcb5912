//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use triage_classifiers::PipelineContext;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Prediction pipeline with its risk model registry
    pub pipeline: Arc<PipelineContext>,

    /// Prometheus metrics handle for rendering, if a recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,

    /// Allow cross-origin requests from any origin
    pub cors_permissive: bool,
}

impl AppState {
    pub fn new(pipeline: PipelineContext) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics_handle: None,
            cors_permissive: true,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}
