//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;
use triage_core::PredictionResult;

use crate::state::AppState;

/// Requests received per route
pub const HTTP_REQUESTS_TOTAL: &str = "triage_http_requests_total";

/// Body fields that may carry the report text, in order of precedence
const TEXT_FIELDS: [&str; 2] = ["description", "text"];

pub fn create_router(state: AppState) -> Router {
    let cors_permissive = state.cors_permissive;

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/admin/reload", post(reload_models))
        .route("/metrics", get(render_metrics))
        .fallback(fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn index() -> &'static str {
    "ML API is running..."
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": state.pipeline.state().as_str() }))
}

/// Label an incident report with a category and risk level
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResult>, AppError> {
    metrics::counter!(HTTP_REQUESTS_TOTAL, "route" => "/predict").increment(1);

    let text = extract_text(&body)?;
    let prediction = state.pipeline.classify_detailed(&text).await;
    debug!(
        "Predicted {} / {} ({}, {}us)",
        prediction.result.category,
        prediction.result.risk,
        prediction.outcome.as_str(),
        prediction.latency_us
    );

    Ok(Json(prediction.result))
}

/// Drop every cached risk model so the next request reloads from disk
async fn reload_models(State(state): State<AppState>) -> Json<Value> {
    metrics::counter!(HTTP_REQUESTS_TOTAL, "route" => "/admin/reload").increment(1);

    let invalidated = state.pipeline.registry().invalidate_all();
    Json(json!({ "invalidated": invalidated }))
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn fallback() -> AppError {
    AppError::NotFound
}

/// Pull the report text out of a request body.
///
/// The first non-empty string among `description` and `text` wins. When the
/// fields are present but empty, the empty string is passed through to the
/// pipeline.
fn extract_text(body: &[u8]) -> Result<String, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::InvalidRequest("No JSON received".to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AppError::InvalidRequest("No JSON received".to_string()))?;

    let candidates: Vec<&str> = TEXT_FIELDS
        .iter()
        .filter_map(|field| object.get(*field).and_then(Value::as_str))
        .collect();
    if candidates.is_empty() {
        return Err(AppError::InvalidRequest(
            "description is required".to_string(),
        ));
    }

    Ok(candidates
        .into_iter()
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string())
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
