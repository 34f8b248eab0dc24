use crate::e2e::helpers;

use helpers::{TestContext, MAX_TEXT_CHARS, QUEUE_NAME};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;
use voicecast_backend::domain::job::{JobEnvelope, JobPayload};

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_a_plain_text_job(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");

    let response = ctx
        .client
        .post_with_auth(
            "/api/jobs",
            &json!({ "kind": "plain_text", "text": "Hello there, this is a short note." }),
            &token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::ACCEPTED);
    let job_id = response.field("job_id").and_then(|v| v.as_str()).unwrap();
    assert_eq!(response.field("notice_sent"), Some(&json!(false)));

    let queued = ctx.store.list(QUEUE_NAME).await;
    assert_eq!(queued.len(), 1);
    let envelope: JobEnvelope = serde_json::from_str(&queued[0]).unwrap();
    assert_eq!(envelope.id.to_string(), job_id);
    assert_eq!(envelope.owner_id.as_str(), "owner-1");
    assert_eq!(envelope.preferences.voice.as_deref(), Some("nova"));
    assert!(matches!(envelope.payload, JobPayload::PlainText { .. }));

    // A status message was opened for the job
    assert_eq!(ctx.reporter.messages_to("owner-1").len(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_authentication(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/jobs", &json!({ "kind": "plain_text", "text": "hi" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.queue.pending().await.unwrap(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_tokens_signed_with_another_secret(ctx: &TestContext) {
    let foreign = voicecast_backend::domain::auth::JwtManager::new("another-secret".to_string())
        .generate_token(&"owner-1".into(), chrono::Duration::hours(1))
        .unwrap();

    let response = ctx
        .client
        .get_with_auth("/api/usage", &foreign)
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");

    let response = ctx
        .client
        .post_with_auth("/api/jobs", &json!({ "kind": "plain_text", "text": "  \n " }), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("text cannot be empty");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_over_the_maximum(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");
    let text = "a".repeat(MAX_TEXT_CHARS + 1);

    let response = ctx
        .client
        .post_with_auth("/api/jobs", &json!({ "kind": "plain_text", "text": text }), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(ctx.queue.pending().await.unwrap(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unknown_kinds(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");

    let response = ctx
        .client
        .post_with_auth("/api/jobs", &json!({ "kind": "sticker" }), &token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("unknown job kind");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_file_jobs_without_a_file(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");

    let response = ctx
        .client
        .post_with_auth("/api/jobs", &json!({ "kind": "voice_transcript" }), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_block_the_eleventh_request_in_a_minute(ctx: &TestContext) {
    let token = ctx.token_for("busy-owner");

    for i in 0..10 {
        ctx.client
            .post_with_auth(
                "/api/jobs",
                &json!({ "kind": "plain_text", "text": format!("Message number {}.", i) }),
                &token,
            )
            .await
            .unwrap()
            .assert_status(StatusCode::ACCEPTED);
    }

    let response = ctx
        .client
        .post_with_auth(
            "/api/jobs",
            &json!({ "kind": "plain_text", "text": "One too many." }),
            &token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.field("reason"), Some(&json!("minute_limit")));
    assert_eq!(ctx.queue.pending().await.unwrap(), 10);

    // Other owners are unaffected
    let other = ctx.token_for("quiet-owner");
    ctx.client
        .post_with_auth("/api/jobs", &json!({ "kind": "plain_text", "text": "Hi." }), &other)
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_notify_once_when_the_daily_budget_is_exceeded(ctx: &TestContext) {
    let token = ctx.token_for("reader");
    let long_text = "word ".repeat(3_000); // 15,000 characters

    let mut notices = Vec::new();
    for _ in 0..3 {
        let response = ctx
            .client
            .post_with_auth(
                "/api/jobs",
                &json!({ "kind": "plain_text", "text": long_text }),
                &token,
            )
            .await
            .unwrap();

        // Over budget is never blocked
        response.assert_status(StatusCode::ACCEPTED);
        notices.push(response.field("notice_sent").and_then(|v| v.as_bool()).unwrap());
    }

    assert_eq!(notices, vec![false, true, false]);
    assert_eq!(ctx.queue.pending().await.unwrap(), 3);

    let budget_messages = ctx
        .reporter
        .messages_to("reader")
        .into_iter()
        .filter(|text| text.contains("budget"))
        .count();
    assert_eq!(budget_messages, 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_usage(ctx: &TestContext) {
    let token = ctx.token_for("owner-1");

    for text in ["First note.", "Second note!"] {
        ctx.client
            .post_with_auth("/api/jobs", &json!({ "kind": "plain_text", "text": text }), &token)
            .await
            .unwrap()
            .assert_status(StatusCode::ACCEPTED);
    }

    let response = ctx.client.get_with_auth("/api/usage", &token).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["usage"]["requests_this_minute"], json!(2));
    assert_eq!(body["usage"]["characters_today"], json!(23));
    assert_eq!(body["usage"]["notified_today"], json!(false));
    assert_eq!(body["limits"]["requests_per_minute"], json!(10));
    assert_eq!(body["limits"]["characters_per_day"], json!(20000));
    assert!(body.get("day_resets_at").is_some());
}
