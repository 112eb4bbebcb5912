//! Metric names and descriptions emitted by the classifiers
//!
//! Recording goes through the `metrics` facade; nothing is exported unless
//! the host process installs a recorder (the server installs Prometheus).

/// Predictions by outcome
pub const PREDICTIONS_TOTAL: &str = "triage_predictions_total";

/// Risk model resolutions that touched storage, by result
pub const RISK_MODEL_LOADS_TOTAL: &str = "triage_risk_model_loads_total";

/// End-to-end classify latency
pub const CLASSIFY_LATENCY_US: &str = "triage_classify_latency_us";

/// Register descriptions for every metric above
pub fn describe_metrics() {
    metrics::describe_counter!(PREDICTIONS_TOTAL, "Total number of predictions by outcome");
    metrics::describe_counter!(
        RISK_MODEL_LOADS_TOTAL,
        "Risk model loads from the artifact store by result"
    );
    metrics::describe_histogram!(
        CLASSIFY_LATENCY_US,
        metrics::Unit::Microseconds,
        "Classification latency in microseconds"
    );
}
