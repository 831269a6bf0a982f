use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use test_context::test_context;
use volc_batch_tts::domain::batch::dto::{BatchResponse, LimiterListResponse, RegisterLimiterResponse};

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_admin_key_to_register(ctx: &TestContext) {
    let body = json!({ "limiter_id": "shared1", "limit": 1 });

    let response = ctx.client.post("/_admin/limiters", &body).await.unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_code("unauthorized");

    let response = ctx
        .client
        .post_with_headers("/_admin/limiters", &body, &[("Admin-API-Key", "wrong")])
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid admin API key");
}

#[tokio::test]
async fn it_should_refuse_admin_routes_without_configured_key() {
    let ctx = TestContext::start_with(|config| config.admin_api_key = None)
        .await
        .unwrap();

    let response = ctx
        .client
        .post_with_headers(
            "/_admin/limiters",
            &json!({ "limiter_id": "shared1", "limit": 1 }),
            &[("Admin-API-Key", "")],
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_register_limiter_idempotently(ctx: &TestContext) {
    let response = ctx
        .client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 1 }))
        .await
        .unwrap();
    response.assert_status(StatusCode::CREATED);
    let first: RegisterLimiterResponse = response.json().unwrap();
    assert!(first.created);
    assert_eq!(first.limit, 1);
    assert_eq!(first.available_limiters, vec!["shared1".to_string()]);

    let response = ctx
        .client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 10 }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    let second: RegisterLimiterResponse = response.json().unwrap();
    assert!(!second.created);
    assert_eq!(second.limit, 1);
    assert_eq!(second.available_limiters, vec!["shared1".to_string()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_limits(ctx: &TestContext) {
    for limit in [0, 1001] {
        let response = ctx
            .client
            .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "x", "limit": limit }))
            .await
            .unwrap();
        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_code("bad_request");
    }

    let response = ctx
        .client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "  ", "limit": 3 }))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_registered_limiters(ctx: &TestContext) {
    for (id, limit) in [("beta", 2), ("alpha", 5)] {
        ctx.client
            .post_as_admin("/_admin/limiters", &json!({ "limiter_id": id, "limit": limit }))
            .await
            .unwrap()
            .assert_status(StatusCode::CREATED);
    }

    let response = ctx.client.get_as_admin("/_admin/limiters").await.unwrap();
    response.assert_status(StatusCode::OK);
    let body: LimiterListResponse = response.json().unwrap();

    assert_eq!(body.count, 2);
    let ids: Vec<&str> = body.limiters.iter().map(|l| l.limiter_id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
    assert_eq!(body.limiters[0].limit, 5);
    assert_eq!(body.limiters[0].available, 5);

    ctx.client
        .get("/_admin/limiters")
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_share_one_limiter_across_concurrent_batches(ctx: &TestContext) {
    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 1 }))
        .await
        .unwrap()
        .assert_status(StatusCode::CREATED);
    ctx.tts.set_delay(Duration::from_millis(30));

    let mut requests = Vec::new();
    for batch in 0..2 {
        let client = ctx.client.clone();
        requests.push(async move {
            client
                .post(
                    "/generate-batch",
                    &json!({
                        "tasks": [
                            { "prompt": format!("batch {} one", batch) },
                            { "prompt": format!("batch {} two", batch) }
                        ],
                        "external_limiter_id": "shared1"
                    }),
                )
                .await
        });
    }

    let results = futures::future::join_all(requests).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
        let body: BatchResponse = response.json().unwrap();
        assert_eq!(body.successful_count, 2);
        assert!(body.external_limiter_used);
        assert_eq!(body.limiter_id.as_deref(), Some("shared1"));
    }
    assert_eq!(ctx.tts.call_count(), 4);
    assert_eq!(ctx.tts.max_active(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_original_limit_after_larger_re_registration(ctx: &TestContext) {
    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 1 }))
        .await
        .unwrap()
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 50 }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    let again: RegisterLimiterResponse = response.json().unwrap();
    assert!(!again.created);
    assert_eq!(again.limit, 1);

    ctx.tts.set_delay(Duration::from_millis(10));

    let mut requests = Vec::new();
    for batch in 0..2 {
        let client = ctx.client.clone();
        let tasks: Vec<_> = (0..8)
            .map(|i| json!({ "prompt": format!("batch {} task {}", batch, i) }))
            .collect();
        requests.push(async move {
            client
                .post(
                    "/generate-batch",
                    &json!({
                        "tasks": tasks,
                        "external_limiter_id": "shared1",
                        "credentials": { "volcengine_tts_concurrency": 50 }
                    }),
                )
                .await
        });
    }

    for result in futures::future::join_all(requests).await {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
        let body: BatchResponse = response.json().unwrap();
        assert!(body.success);
        assert_eq!(body.successful_count, 8);
    }
    assert_eq!(ctx.tts.call_count(), 16);
    assert_eq!(ctx.tts.max_active(), 1);
}

#[tokio::test]
async fn it_should_refuse_registration_after_shutdown() {
    let ctx = TestContext::start(helpers::test_config()).await.unwrap();
    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 1 }))
        .await
        .unwrap()
        .assert_status(StatusCode::CREATED);

    ctx.batch_service.shutdown().await;

    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "limiter_id": "shared1", "limit": 1 }))
        .await
        .unwrap()
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)
        .assert_error_code("limiter_unavailable");

    let response = ctx
        .client
        .post(
            "/generate-batch",
            &json!({ "tasks": [{ "prompt": "hi" }], "external_limiter_id": "shared1" }),
        )
        .await
        .unwrap();
    response
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)
        .assert_error_code("limiter_unavailable");
    assert_eq!(ctx.tts.call_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_semaphore_alias_for_limiter_id(ctx: &TestContext) {
    ctx.client
        .post_as_admin("/_admin/limiters", &json!({ "semaphore_id": "legacy", "max_concurrent": 2 }))
        .await
        .unwrap()
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .client
        .post(
            "/generate-batch",
            &json!({
                "tasks": [{ "prompt": "hi" }],
                "external_semaphore_id": "legacy",
                "credentials": { "volcengine_tts_concurrency": 8 }
            }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body: BatchResponse = response.json().unwrap();
    assert_eq!(body.limiter_id.as_deref(), Some("legacy"));
    assert_eq!(body.warnings.len(), 1);
    assert!(body.warnings[0].contains("legacy"));
}
