//! Host hook endpoints.
//!
//! The host queue calls these from its submission and completion paths.
//! Responses only acknowledge receipt: a failed registration or delivery is
//! logged here and never turned into an error status for the host.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use hookrelay_comfyui::{CompletionPayload, PromptRequest, QueueItem, QueueObserver, Resolution};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Acknowledgement for submission hooks.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub registered: bool,
}

/// Body of `POST /hooks/task-done`.
#[derive(Debug, Deserialize)]
pub struct TaskDoneRequest {
    /// `None` when the host could not map the finished item to a prompt.
    #[serde(default)]
    pub prompt_id: Option<String>,
    /// Raw node outputs as reported by the host.
    #[serde(default)]
    pub outputs: serde_json::Value,
    /// Host execution status, logged only.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

/// Acknowledgement for the completion hook.
#[derive(Debug, Serialize)]
pub struct TaskDoneResponse {
    /// The prompt was tracked and an event was built.
    pub resolved: bool,
    /// The endpoint accepted the event.
    pub delivered: bool,
}

/// POST /hooks/prompt
async fn prompt_submitted(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> (StatusCode, Json<RegisterResponse>) {
    let registered = state.tracker.on_prompt_request(&request).await;
    (StatusCode::ACCEPTED, Json(RegisterResponse { registered }))
}

/// POST /hooks/queue
async fn item_queued(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> (StatusCode, Json<RegisterResponse>) {
    let registered = match QueueItem::from_value(raw) {
        Ok(item) => state.tracker.on_put(&item).await,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring queue item");
            false
        }
    };
    (StatusCode::ACCEPTED, Json(RegisterResponse { registered }))
}

/// POST /hooks/task-done
async fn task_done(
    State(state): State<AppState>,
    Json(request): Json<TaskDoneRequest>,
) -> Json<TaskDoneResponse> {
    tracing::info!(
        prompt_id = ?request.prompt_id,
        status = ?request.status,
        "Task done called",
    );

    // Unreadable outputs still complete the prompt, reported as "no images".
    let payload = CompletionPayload::from_outputs(request.outputs).unwrap_or_else(|e| {
        tracing::warn!(
            prompt_id = ?request.prompt_id,
            error = %e,
            "Malformed completion outputs, treating as empty",
        );
        CompletionPayload::default()
    });

    let resolution = state
        .tracker
        .on_task_done(request.prompt_id.as_deref(), &payload)
        .await;

    let response = match resolution {
        Resolution::Reported { outcome, .. } => TaskDoneResponse {
            resolved: true,
            delivered: outcome.is_delivered(),
        },
        Resolution::NotFound => TaskDoneResponse {
            resolved: false,
            delivered: false,
        },
    };
    Json(response)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hooks/prompt", post(prompt_submitted))
        .route("/hooks/queue", post(item_queued))
        .route("/hooks/task-done", post(task_done))
}
