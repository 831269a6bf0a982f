use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use volc_batch_tts::{
    controllers::{batch::BatchController, health::HealthController, limiters::LimiterController},
    domain::batch::{BatchService, BatchServiceConfig, Credentials, LimiterMode, LimiterRegistry},
    infrastructure::{
        config::{Config, Environment, LogFormat},
        http::create_router,
    },
};

pub mod fake_tts;

use api_client::TestClient;
use fake_tts::FakeTts;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const SERVER_APP_ID: &str = "server-app";

#[allow(dead_code)]
pub struct TestContext {
    pub client: TestClient,
    pub config: Config,
    pub tts: Arc<FakeTts>,
    pub batch_service: Arc<BatchService>,
}

/// Baseline configuration: admin key set, server credentials set,
/// process-wide limiter with capacity 4.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0, // Will be assigned by the OS
        environment: Environment::Development,
        log_format: LogFormat::Pretty,
        default_concurrency: 4,
        limiter_mode: LimiterMode::Global,
        batch_timeout: None,
        admin_api_key: Some(ADMIN_KEY.to_string()),
        server_credentials: Some(Credentials::new(SERVER_APP_ID, "server-access-key")),
        tts_endpoint: "http://127.0.0.1:9/unused".to_string(),
        tts_cluster: "volcano_tts".to_string(),
        tts_request_timeout: Duration::from_secs(5),
        default_voice_type: "BV001_streaming".to_string(),
    }
}

impl TestContext {
    /// Starts a server with `config` and a fresh fake TTS backend
    pub async fn start(config: Config) -> Result<Self> {
        let tts = Arc::new(FakeTts::default());
        let shared_config = Arc::new(config.clone());

        let batch_service = Arc::new(BatchService::new(
            tts.clone(),
            Arc::new(LimiterRegistry::new()),
            BatchServiceConfig {
                limiter_mode: config.limiter_mode,
                default_concurrency: config.default_concurrency,
                request_timeout: config.tts_request_timeout,
                batch_timeout: config.batch_timeout,
            },
        )?);

        let batch_controller = Arc::new(BatchController::new(batch_service.clone(), shared_config.clone()));
        let limiter_controller = Arc::new(LimiterController::new(batch_service.clone()));
        let health_controller = Arc::new(HealthController::new(batch_service.clone(), shared_config.clone()));
        let app = create_router(shared_config, batch_controller, limiter_controller, health_controller);

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to be ready
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            client: TestClient::new(&base_url),
            config,
            tts,
            batch_service,
        })
    }

    pub async fn start_with(customize: impl FnOnce(&mut Config)) -> Result<Self> {
        let mut config = test_config();
        customize(&mut config);
        Self::start(config).await
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            TestContext::start(test_config())
                .await
                .expect("Failed to start test server")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.batch_service.shutdown().await;
        }
    }
}
