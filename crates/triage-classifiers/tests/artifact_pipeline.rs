//! End-to-end pipeline tests over JSON artifacts on disk

use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use triage_classifiers::{Outcome, PipelineConfig, PipelineContext};
use triage_core::PredictionResult;

const VOCABULARY: [&str; 10] = [
    "loud", "noise", "music", "party", "fire", "smoke", "alarm", "stolen", "bike", "wallet",
];

fn one_hot(terms: &[&str]) -> Vec<f32> {
    VOCABULARY
        .iter()
        .map(|t| if terms.contains(t) { 1.0 } else { 0.0 })
        .collect()
}

fn write_json(path: &Path, value: serde_json::Value) {
    std::fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

/// Lays out models/ and risk_models/ the way a training job would
fn fixture() -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("models");
    let risk_models = dir.path().join("risk_models");
    std::fs::create_dir_all(&models).unwrap();
    std::fs::create_dir_all(&risk_models).unwrap();

    let vocabulary: serde_json::Map<String, serde_json::Value> = VOCABULARY
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), json!(i)))
        .collect();
    write_json(
        &models.join("tfidf.json"),
        json!({
            "vocabulary": vocabulary,
            "idf": vec![1.0; VOCABULARY.len()],
        }),
    );

    write_json(
        &models.join("category_model.json"),
        json!({
            "classes": ["Noise Complaint", "Fire", "Theft"],
            "coef": [
                one_hot(&["loud", "noise", "music", "party"]),
                one_hot(&["fire", "smoke", "alarm"]),
                one_hot(&["stolen", "bike", "wallet"]),
            ],
            "intercept": [0.0, 0.0, 0.0],
        }),
    );

    let mut loud = vec![0.0; VOCABULARY.len()];
    loud[0] = 0.7;
    loud[1] = 0.7;
    write_json(
        &risk_models.join("noise_complaint_kmeans.json"),
        json!({
            "cluster_centers": [one_hot(&["music"]), one_hot(&["party"]), loud],
        }),
    );
    write_json(
        &risk_models.join("noise_complaint_risk_map.json"),
        json!({"0": "Low", "1": "Moderate", "2": "High"}),
    );

    let config = PipelineConfig {
        category_model: models.join("category_model.json"),
        vectorizer: models.join("tfidf.json"),
        risk_models_dir: risk_models,
        ..Default::default()
    };

    (dir, config)
}

#[tokio::test]
async fn test_category_and_risk_from_artifacts() {
    let (_dir, config) = fixture();
    let context = PipelineContext::initialize(&config).await.unwrap();
    assert!(context.is_ready());

    assert_eq!(
        context.classify("loud noise complaint").await,
        PredictionResult::new("Noise Complaint", "High")
    );
    assert_eq!(
        context.classify("Music playing all night").await,
        PredictionResult::new("Noise Complaint", "Low")
    );
    assert_eq!(
        context.classify("there is a party next door").await,
        PredictionResult::new("Noise Complaint", "Moderate")
    );
}

#[tokio::test]
async fn test_category_without_risk_artifacts() {
    let (_dir, config) = fixture();
    let context = PipelineContext::initialize(&config).await.unwrap();

    let prediction = context.classify_detailed("smoke and fire in the kitchen").await;
    assert_eq!(prediction.result, PredictionResult::new("Fire", "Unknown"));
    assert_eq!(prediction.outcome, Outcome::NoRiskModel);

    assert_eq!(
        context.classify("my bike was stolen").await,
        PredictionResult::new("Theft", "Unknown")
    );
}

#[tokio::test]
async fn test_risk_artifacts_added_after_startup_are_picked_up() {
    let (_dir, config) = fixture();
    let context = PipelineContext::initialize(&config).await.unwrap();

    assert_eq!(context.classify("fire alarm").await.risk, "Unknown");

    write_json(
        &config.risk_models_dir.join("fire_kmeans.json"),
        json!({"cluster_centers": [one_hot(&["alarm"]), one_hot(&["fire", "smoke"])]}),
    );
    write_json(
        &config.risk_models_dir.join("fire_risk_map.json"),
        json!({"0": "Low", "1": "High"}),
    );

    assert_eq!(
        context.classify("fire alarm").await,
        PredictionResult::new("Fire", "Low")
    );
}

#[tokio::test]
async fn test_missing_classifier_degrades() {
    let (_dir, mut config) = fixture();
    config.category_model = config.category_model.with_file_name("missing.json");

    let context = PipelineContext::initialize(&config).await.unwrap();
    assert!(!context.is_ready());
    assert_eq!(
        context.classify("loud noise complaint").await,
        PredictionResult::model_not_loaded()
    );
    assert_eq!(context.classify("").await, PredictionResult::unknown());
}

#[tokio::test]
async fn test_corrupt_vectorizer_degrades() {
    let (_dir, config) = fixture();
    std::fs::write(&config.vectorizer, b"{\"vocabulary\": {}").unwrap();

    let context = PipelineContext::initialize(&config).await.unwrap();
    assert_eq!(
        context.classify("loud noise").await,
        PredictionResult::model_not_loaded()
    );
}

#[tokio::test]
async fn test_preload_resolves_configured_categories() {
    let (_dir, mut config) = fixture();
    config.preload = vec!["Noise Complaint".to_string(), "Fire".to_string()];

    let context = PipelineContext::initialize(&config).await.unwrap();
    let stats = context.registry().stats();
    assert_eq!(stats.loads, 1);
    assert_eq!(stats.misses, 1);

    context.classify("loud noise complaint").await;
    assert_eq!(context.registry().stats().loads, 1);
}

#[tokio::test]
async fn test_preload_rejects_mismatched_dimension() {
    let (_dir, mut config) = fixture();
    write_json(
        &config.risk_models_dir.join("noise_complaint_kmeans.json"),
        json!({"cluster_centers": [[0.0, 1.0], [1.0, 0.0]]}),
    );
    config.preload = vec!["Noise Complaint".to_string()];

    assert!(PipelineContext::initialize(&config).await.is_err());
}

#[tokio::test]
async fn test_classification_is_deterministic() {
    let (_dir, config) = fixture();
    let context = PipelineContext::initialize(&config).await.unwrap();

    let texts = [
        "loud noise complaint",
        "party music",
        "smoke alarm",
        "wallet stolen",
        "nothing in the vocabulary",
    ];
    for text in texts {
        let first = context.classify(text).await;
        for _ in 0..5 {
            assert_eq!(context.classify(text).await, first);
        }
    }
}
