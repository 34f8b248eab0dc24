use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_queue_connectivity_when_ready(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);

    assert_eq!(response.field("status").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(
        response.field("queueConnectivity").and_then(|v| v.as_str()),
        Some("connected")
    );
    // Preferences database is not wired in this harness
    assert_eq!(
        response.field("database").and_then(|v| v.as_str()),
        Some("not_configured")
    );
    assert_eq!(response.field("pendingJobs").and_then(|v| v.as_u64()), Some(0));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_count_pending_jobs_in_readiness(ctx: &TestContext) {
    let token = ctx.token_for("owner-7");
    ctx.client
        .post_with_auth(
            "/api/jobs",
            &serde_json::json!({ "kind": "plain_text", "text": "Queued and waiting." }),
            &token,
        )
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let response = ctx.client.get("/health/ready").await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.field("pendingJobs").and_then(|v| v.as_u64()), Some(1));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/health/ready").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_echo_inbound_request_id(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "update-12345")])
        .await
        .unwrap();

    assert_eq!(
        response.header("x-request-id").map(String::as_str),
        Some("update-12345")
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let mut futures = Vec::new();
    for _ in 0..10 {
        let client = ctx.client.clone();
        futures.push(async move { client.get("/health/ready").await });
    }

    let results = futures::future::join_all(futures).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
    }
}
