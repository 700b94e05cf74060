use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use hookrelay_comfyui::CorrelationTracker;
use hookrelay_events::WebhookDelivery;
use http_body_util::BodyExt;
use tower::ServiceExt;

use hookrelay_server::router::build_app_router;
use hookrelay_server::state::AppState;

/// Build the application router delivering to `webhook_url`.
///
/// Returns the tracker too so tests can inspect correlation state.
pub fn build_test_app(webhook_url: &str) -> (Router, Arc<CorrelationTracker>) {
    let tracker = Arc::new(CorrelationTracker::new(Arc::new(WebhookDelivery::new(
        webhook_url,
    ))));
    let state = AppState {
        tracker: Arc::clone(&tracker),
    };
    (build_app_router(state), tracker)
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// POST a JSON body through the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
