//! End-to-end tests: tracker + real webhook delivery against a mock endpoint.

use std::sync::Arc;

use assert_matches::assert_matches;
use hookrelay_comfyui::{CompletionPayload, CorrelationTracker, QueueItem, QueueObserver, Resolution};
use hookrelay_events::{DeliveryOutcome, WebhookDelivery};
use mockito::{Matcher, Server};

fn tracker_for(server: &mockito::ServerGuard) -> CorrelationTracker {
    let delivery = WebhookDelivery::new(format!("{}/events", server.url()));
    CorrelationTracker::new(Arc::new(delivery))
}

fn outputs(json: serde_json::Value) -> CompletionPayload {
    CompletionPayload::from_outputs(json).expect("valid outputs")
}

// ---------------------------------------------------------------------------
// Test: successful prompt posts a success event with image names
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_prompt_posts_success_event() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/events")
        .match_body(Matcher::Json(serde_json::json!({
            "event_type": "workflow_completed",
            "data": {
                "client_id": "clientA",
                "prompt_id": "p1",
                "status": "success",
                "image_names": ["x.png", "out/y.png"],
            },
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    tracker.register("p1", "clientA").await;

    let resolution = tracker
        .resolve_and_remove(
            "p1",
            &outputs(serde_json::json!({
                "9": {"images": [
                    {"filename": "x.png", "subfolder": "", "type": "output"},
                    {"filename": "y.png", "subfolder": "out", "type": "output"},
                    {"filename": "z.png", "subfolder": "", "type": "temp"},
                ]}
            })),
        )
        .await;

    mock.assert_async().await;
    assert_matches!(
        resolution,
        Resolution::Reported {
            outcome: DeliveryOutcome::Delivered { status: 200, .. },
            ..
        }
    );
}

// ---------------------------------------------------------------------------
// Test: prompt without output images posts a failed event
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_without_images_posts_failed_event() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/events")
        .match_body(Matcher::Json(serde_json::json!({
            "event_type": "workflow_completed",
            "data": {
                "client_id": "c1",
                "prompt_id": "p2",
                "status": "failed",
                "error_message": "No images were generated",
            },
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    tracker.register("p2", "c1").await;
    tracker
        .resolve_and_remove("p2", &outputs(serde_json::json!({"3": {"text": ["done"]}})))
        .await;

    mock.assert_async().await;
}

// ---------------------------------------------------------------------------
// Test: unknown prompts never reach the endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_prompt_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/events")
        .expect(0)
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    let resolution = tracker
        .resolve_and_remove("ghost", &CompletionPayload::default())
        .await;

    mock.assert_async().await;
    assert_eq!(resolution, Resolution::NotFound);
}

#[tokio::test]
async fn double_completion_posts_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/events")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    tracker.register("p1", "c1").await;

    let first = tracker.resolve_and_remove("p1", &CompletionPayload::default()).await;
    let second = tracker.resolve_and_remove("p1", &CompletionPayload::default()).await;

    mock.assert_async().await;
    assert!(!first.is_not_found());
    assert!(second.is_not_found());
}

// ---------------------------------------------------------------------------
// Test: endpoint failures are absorbed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_is_absorbed_and_entry_still_removed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/events")
        .with_status(500)
        .with_body("down for maintenance")
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    tracker.register("p1", "c1").await;
    let resolution = tracker.resolve_and_remove("p1", &CompletionPayload::default()).await;

    assert_matches!(
        resolution,
        Resolution::Reported {
            outcome: DeliveryOutcome::RejectedByServer { status: 500, ref body },
            ..
        } if body == "down for maintenance"
    );
    assert!(!tracker.is_pending("p1").await);
}

#[tokio::test]
async fn unreachable_endpoint_is_absorbed() {
    let tracker = CorrelationTracker::new(Arc::new(WebhookDelivery::new("http://127.0.0.1:1/events")));
    tracker.register("p1", "c1").await;

    let resolution = tracker.resolve_and_remove("p1", &CompletionPayload::default()).await;

    assert_matches!(
        resolution,
        Resolution::Reported {
            outcome: DeliveryOutcome::TransportFailure(_),
            ..
        }
    );
}

// ---------------------------------------------------------------------------
// Test: queue hook path end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_put_and_task_done_round_trip() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/events")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "data": {"client_id": "web-42", "prompt_id": "abc", "image_names": ["ComfyUI_00001_.png"]},
        })))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;

    let tracker = tracker_for(&server);
    let item: QueueItem = serde_json::from_str(
        r#"[7, "abc", {"9": {"class_type": "SaveImage"}}, {"client_id": "web-42"}, ["9"]]"#,
    )
    .unwrap();

    assert!(tracker.on_put(&item).await);
    let payload = outputs(serde_json::json!({
        "9": {"images": [{"filename": "ComfyUI_00001_.png", "subfolder": "", "type": "output"}]}
    }));
    let resolution = tracker.on_task_done(Some("abc"), &payload).await;

    mock.assert_async().await;
    assert!(resolution.event().is_some());
}
