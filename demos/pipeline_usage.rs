//! Example: Classifying incident reports with the two-stage pipeline
//!
//! This example shows how to:
//! 1. Load the pipeline configuration from YAML (or use the defaults)
//! 2. Initialize the pipeline and preload risk models
//! 3. Classify a few reports and inspect the outcome of each
//!
//! Run with: cargo run --example pipeline_usage -- [pipeline.yaml]

use triage_classifiers::{PipelineConfig, PipelineContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("Incident Triage Pipeline Example");
    println!("================================\n");

    // 1. Configuration
    let config = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading configuration from {}...", path);
            PipelineConfig::from_file(&path)?
        }
        None => {
            println!("No configuration given, using defaults");
            PipelineConfig::default()
        }
    };
    println!("  - Category model: {}", config.category_model.display());
    println!("  - Vectorizer: {}", config.vectorizer.display());
    println!("  - Risk models: {}\n", config.risk_models_dir.display());

    // 2. Initialization never fails on missing core models; it degrades
    let context = PipelineContext::initialize(&config).await?;
    println!("Pipeline state: {}\n", context.state().as_str());

    // 3. Classification
    let reports = [
        "Loud music playing all night next door",
        "Smoke coming from the kitchen window",
        "Someone stole my bike from the rack",
        "",
    ];

    for report in reports {
        let prediction = context.classify_detailed(report).await;
        println!("Report: {:?}", report);
        println!("  Category: {}", prediction.result.category);
        println!("  Risk:     {}", prediction.result.risk);
        println!(
            "  Outcome:  {} ({}µs)\n",
            prediction.outcome.as_str(),
            prediction.latency_us
        );
    }

    let stats = context.registry().stats();
    println!(
        "Risk models: {} loaded, {} cache hits, {} missing, {} failed",
        stats.loads, stats.hits, stats.misses, stats.failures
    );

    Ok(())
}
