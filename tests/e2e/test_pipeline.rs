use crate::e2e::helpers;

use helpers::fakes::Sent;
use helpers::TestContext;
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_deliver_audio_for_a_plain_text_job(ctx: &mut TestContext) {
    ctx.start_workers(2);
    let token = ctx.token_for("42");

    ctx.client
        .post_with_auth(
            "/api/jobs",
            &json!({ "kind": "plain_text", "text": "Read this aloud, please." }),
            &token,
        )
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let reporter = ctx.reporter.clone();
    assert!(ctx.wait_until(|| !reporter.audio_deliveries().is_empty()).await);

    let deliveries = ctx.reporter.audio_deliveries();
    assert_eq!(
        deliveries,
        vec![Sent::Audio {
            owner: "42".to_string(),
            bytes: b"[Read this aloud, please.]".to_vec(),
            caption: None,
        }]
    );

    // Owner preferences reached the provider
    let requests = ctx.tts.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].voice, "nova");
    assert_eq!(requests[0].speed, 1.25);

    // Status message removed before the audio went out
    let sent = ctx.reporter.sent();
    let delete_at = sent
        .iter()
        .position(|s| matches!(s, Sent::Delete { .. }))
        .unwrap();
    let audio_at = sent
        .iter()
        .position(|s| matches!(s, Sent::Audio { .. }))
        .unwrap();
    assert!(delete_at < audio_at);

    // Job acknowledged
    let queue = ctx.queue.clone();
    let store = ctx.store.clone();
    let in_flight = format!("{}:in_flight", queue.name());
    let mut drained = false;
    for _ in 0..50 {
        if queue.pending().await.unwrap() == 0 && store.list(&in_flight).await.is_empty() {
            drained = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(drained);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_enhance_voice_transcripts_before_synthesis(ctx: &mut TestContext) {
    ctx.start_workers(1);
    let token = ctx.token_for("42");

    ctx.client
        .post_with_auth(
            "/api/jobs",
            &json!({
                "kind": "voice_transcript",
                "file": { "file_id": "voice-1", "mime_type": "audio/ogg" }
            }),
            &token,
        )
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let reporter = ctx.reporter.clone();
    assert!(ctx.wait_until(|| !reporter.audio_deliveries().is_empty()).await);

    let requests = ctx.tts.requests();
    assert_eq!(requests[0].text, "REMEMBER TO BUY MILK");

    // Transcript length lands on the day counter once known
    let response = ctx.client.get_with_auth("/api/usage", &token).await.unwrap();
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["usage"]["characters_today"], json!(20));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_read_uploaded_documents_with_file_name_caption(ctx: &mut TestContext) {
    ctx.reporter
        .upload("doc-1", b"# Weekly notes\n\nShip the **release** on Friday.");
    ctx.start_workers(1);
    let token = ctx.token_for("42");

    ctx.client
        .post_with_auth(
            "/api/jobs",
            &json!({
                "kind": "document",
                "file": { "file_id": "doc-1", "mime_type": "text/markdown", "file_name": "notes.md" }
            }),
            &token,
        )
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let reporter = ctx.reporter.clone();
    assert!(ctx.wait_until(|| !reporter.audio_deliveries().is_empty()).await);

    match &ctx.reporter.audio_deliveries()[0] {
        Sent::Audio { bytes, caption, .. } => {
            let spoken = String::from_utf8(bytes.clone()).unwrap();
            assert!(spoken.contains("Weekly notes"));
            assert!(!spoken.contains("**"));
            assert_eq!(caption.as_deref(), Some("notes.md"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_tell_the_owner_when_a_file_cannot_be_read(ctx: &mut TestContext) {
    ctx.start_workers(1);
    let token = ctx.token_for("42");

    ctx.client
        .post_with_auth(
            "/api/jobs",
            &json!({
                "kind": "document",
                "file": { "file_id": "scan-1", "mime_type": "application/pdf", "file_name": "scan.pdf" }
            }),
            &token,
        )
        .await
        .unwrap()
        .assert_status(StatusCode::ACCEPTED);

    let reporter = ctx.reporter.clone();
    assert!(
        ctx.wait_until(|| reporter
            .messages_to("42")
            .iter()
            .any(|text| text.starts_with("❌")))
            .await
    );
    assert!(ctx.reporter.audio_deliveries().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_process_jobs_from_several_owners(ctx: &mut TestContext) {
    ctx.start_workers(3);

    for owner in ["1", "2", "3", "4"] {
        let token = ctx.token_for(owner);
        ctx.client
            .post_with_auth(
                "/api/jobs",
                &json!({ "kind": "plain_text", "text": format!("Hello owner {}.", owner) }),
                &token,
            )
            .await
            .unwrap()
            .assert_status(StatusCode::ACCEPTED);
    }

    let reporter = ctx.reporter.clone();
    assert!(ctx.wait_until(|| reporter.audio_deliveries().len() == 4).await);

    let mut owners: Vec<String> = ctx
        .reporter
        .audio_deliveries()
        .into_iter()
        .filter_map(|s| match s {
            Sent::Audio { owner, .. } => Some(owner),
            _ => None,
        })
        .collect();
    owners.sort();
    assert_eq!(owners, vec!["1", "2", "3", "4"]);
}
