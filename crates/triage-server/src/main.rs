//! Triage Server
//!
//! Serves category and risk predictions for free-text incident reports.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

use triage_classifiers::{telemetry, PipelineContext};
use triage_server::{create_router, routes, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "triage-server")]
#[command(about = "Incident category and risk prediction service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRIAGE_CONFIG", default_value = "server.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long, env = "TRIAGE_LISTEN")]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "TRIAGE_PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting Triage Server");

    let config = ServerConfig::load(&cli.config)?.with_overrides(cli.listen, cli.port);
    info!("Configuration loaded from {}", cli.config);
    info!("Category model: {}", config.pipeline.category_model.display());
    info!("Vectorizer: {}", config.pipeline.vectorizer.display());
    info!("Risk models: {}", config.pipeline.risk_models_dir.display());

    let metrics_handle = init_metrics()?;

    let pipeline = PipelineContext::initialize(&config.pipeline).await?;
    if pipeline.is_ready() {
        info!("Pipeline ready");
    } else {
        warn!("Pipeline degraded, predictions will report 'Model not loaded'");
    }

    let state = AppState::new(pipeline)
        .with_metrics(metrics_handle)
        .with_cors(config.cors_permissive);
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("triage_server=debug,triage_classifiers=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("triage_server=info,triage_classifiers=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    telemetry::describe_metrics();
    metrics::describe_counter!(
        routes::HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests by route"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
