use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controllers::{batch::BatchController, health::HealthController, limiters::LimiterController};
use crate::infrastructure::auth::{admin_middleware, request_id_middleware};
use crate::infrastructure::config::Config;

/// Build the application router with all routes configured
pub fn create_router(
    config: Arc<Config>,
    batch_controller: Arc<BatchController>,
    limiter_controller: Arc<LimiterController>,
    health_controller: Arc<HealthController>,
) -> Router {
    // Batch routes (credentials are resolved per request)
    let batch_routes = Router::new()
        .route("/generate-batch", post(BatchController::generate_batch))
        .route("/generate-batch-legacy", post(BatchController::generate_batch_legacy))
        .with_state(batch_controller);

    // Admin routes (require Admin-API-Key)
    let admin_routes = Router::new()
        .route(
            "/_admin/limiters",
            get(LimiterController::list_limiters).post(LimiterController::register_limiter),
        )
        .with_state(limiter_controller)
        .layer(middleware::from_fn_with_state(config, admin_middleware));

    let health_routes = Router::new()
        .route("/", get(HealthController::health))
        .route("/health", get(HealthController::health))
        .with_state(health_controller);

    Router::new()
        .merge(health_routes)
        .merge(batch_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
