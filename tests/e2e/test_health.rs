use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_limiter_state(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["limiter_mode"], "global");
    assert_eq!(body["global_concurrency_limit"], 4);
    assert_eq!(body["available_slots"], 4);
    assert_eq!(body["registered_limiters"], 0);
    assert_eq!(body["admin_key_configured"], true);
    assert_eq!(body["server_credentials_configured"], true);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_health_on_root(ctx: &TestContext) {
    let response = ctx.client.get("/").await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body()["status"], "healthy");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_count_registered_limiters(ctx: &TestContext) {
    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 3 }))
        .await
        .unwrap()
        .assert_status(StatusCode::CREATED);

    let response = ctx.client.get("/health").await.unwrap();
    assert_eq!(response.body()["registered_limiters"], 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "caller-supplied-id")])
        .await
        .unwrap();
    assert_eq!(
        response.header("x-request-id").map(String::as_str),
        Some("caller-supplied-id")
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let mut futures = Vec::new();
    for _ in 0..10 {
        let client = ctx.client.clone();
        futures.push(async move { client.get("/health").await });
    }

    let results = futures::future::join_all(futures).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn it_should_report_shutdown() {
    let ctx = TestContext::start(helpers::test_config()).await.unwrap();
    ctx.batch_service.shutdown().await;

    let response = ctx.client.get("/health").await.unwrap();
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body()["status"], "shutting_down");
}

#[tokio::test]
async fn it_should_omit_available_slots_in_per_batch_mode() {
    let ctx = TestContext::start_with(|config| {
        config.limiter_mode = volc_batch_tts::domain::batch::LimiterMode::PerBatch
    })
    .await
    .unwrap();

    let response = ctx.client.get("/health").await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body()["limiter_mode"], "per_batch");
    assert!(response.body()["available_slots"].is_null());
}
