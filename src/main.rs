use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volc_batch_tts::controllers::{batch::BatchController, health::HealthController, limiters::LimiterController};
use volc_batch_tts::domain::batch::{BatchService, BatchServiceConfig, LimiterRegistry};
use volc_batch_tts::infrastructure::config::{Config, LogFormat};
use volc_batch_tts::infrastructure::http::{create_router, shutdown_signal, start_http_server};
use volc_batch_tts::infrastructure::repositories::VolcengineTtsRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting volc-batch-tts on {}:{}",
        config.host,
        config.port
    );
    tracing::info!(
        limiter_mode = ?config.limiter_mode,
        default_concurrency = config.default_concurrency,
        batch_timeout = ?config.batch_timeout,
        admin_key_configured = config.admin_api_key.is_some(),
        server_credentials_configured = config.server_credentials.is_some(),
        environment = ?config.environment,
        "Configuration loaded"
    );

    if config.server_credentials.is_none() {
        tracing::warn!("No server TTS credentials configured. Callers must send their own.");
    }

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Repositories
    let tts_repo = Arc::new(VolcengineTtsRepository::new(
        config.tts_endpoint.clone(),
        config.tts_cluster.clone(),
    ));

    // 2. Services
    let registry = Arc::new(LimiterRegistry::new());
    let batch_service = Arc::new(BatchService::new(
        tts_repo,
        registry,
        BatchServiceConfig {
            limiter_mode: config.limiter_mode,
            default_concurrency: config.default_concurrency,
            request_timeout: config.tts_request_timeout,
            batch_timeout: config.batch_timeout,
        },
    )?);

    // 3. Controllers
    let batch_controller = Arc::new(BatchController::new(batch_service.clone(), config.clone()));
    let limiter_controller = Arc::new(LimiterController::new(batch_service.clone()));
    let health_controller = Arc::new(HealthController::new(batch_service.clone(), config.clone()));

    let app = create_router(config.clone(), batch_controller, limiter_controller, health_controller);

    // Start HTTP server with all routes
    start_http_server(config, app, shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    batch_service.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "volc_batch_tts=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "volc_batch_tts=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
