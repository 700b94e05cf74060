//! Correlation of finished prompts with the clients that submitted them.
//!
//! [`CorrelationTracker`] remembers which client queued each prompt. When
//! the prompt completes it removes the entry, turns the node outputs into
//! a `workflow_completed` [`DeliveryEvent`] and hands it to the configured
//! [`EventDelivery`].
//!
//! The map lock is held only for the insert or remove itself; delivery
//! runs after it is released so a slow endpoint cannot stall other hooks.

use std::collections::HashMap;
use std::sync::Arc;

use hookrelay_events::{DeliveryEvent, DeliveryOutcome, EventDelivery};
use tokio::sync::Mutex;

use crate::error::HookError;
use crate::payload::CompletionPayload;

/// Event type sent when a tracked prompt finishes.
pub const WORKFLOW_COMPLETED: &str = "workflow_completed";

/// `error_message` reported when a prompt produced no output images.
pub const NO_IMAGES_MESSAGE: &str = "No images were generated";

/// A prompt and the client that queued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationEntry {
    pub job_id: String,
    pub submitter_id: String,
}

/// Result of [`CorrelationTracker::resolve_and_remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The prompt was tracked; an event was built and a delivery attempted.
    Reported {
        event: DeliveryEvent,
        outcome: DeliveryOutcome,
    },

    /// The prompt was never registered (or was already resolved).
    NotFound,
}

impl Resolution {
    /// The event that was sent, if any.
    pub fn event(&self) -> Option<&DeliveryEvent> {
        match self {
            Self::Reported { event, .. } => Some(event),
            Self::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Tracks in-flight prompts and reports their completion.
///
/// Construct one per process and share it behind an `Arc`.
pub struct CorrelationTracker {
    /// `prompt_id` -> `client_id`.
    pending: Mutex<HashMap<String, String>>,
    delivery: Arc<dyn EventDelivery>,
}

impl CorrelationTracker {
    pub fn new(delivery: Arc<dyn EventDelivery>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            delivery,
        }
    }

    /// Remember that `submitter_id` queued `job_id`.
    ///
    /// Registering the same job again replaces the previous submitter.
    pub async fn register(&self, job_id: impl Into<String>, submitter_id: impl Into<String>) {
        let job_id = job_id.into();
        let submitter_id = submitter_id.into();

        let pending_count = {
            let mut pending = self.pending.lock().await;
            if let Some(previous) = pending.insert(job_id.clone(), submitter_id.clone()) {
                if previous != submitter_id {
                    tracing::warn!(
                        prompt_id = %job_id,
                        previous_client_id = %previous,
                        "Prompt re-registered under a different client",
                    );
                }
            }
            pending.len()
        };

        tracing::info!(client_id = %submitter_id, prompt_id = %job_id, "Registered prompt");
        tracing::debug!(pending_count, "Correlation map updated");
    }

    /// Remove the entry for `job_id` and report its completion.
    ///
    /// Returns [`Resolution::NotFound`] without any delivery when the job is
    /// not tracked. A given registration is resolved at most once.
    pub async fn resolve_and_remove(&self, job_id: &str, payload: &CompletionPayload) -> Resolution {
        tracing::info!(prompt_id = %job_id, "Execution completed");

        let (submitter_id, pending_count) = {
            let mut pending = self.pending.lock().await;
            let removed = pending.remove(job_id);
            (removed, pending.len())
        };

        let Some(submitter_id) = submitter_id else {
            let err = HookError::UnknownJob(job_id.to_owned());
            tracing::error!(error = %err, "Completion for untracked prompt");
            return Resolution::NotFound;
        };
        tracing::info!(prompt_id = %job_id, pending_count, "Removed prompt from correlation map");

        let entry = CorrelationEntry {
            job_id: job_id.to_owned(),
            submitter_id,
        };
        let artifacts = payload.output_artifacts();
        if artifacts.is_empty() {
            tracing::warn!(prompt_id = %job_id, "No images were generated");
        } else {
            tracing::info!(prompt_id = %job_id, images = ?artifacts, "Generated images");
        }

        let event = build_completion_event(&entry, artifacts);
        let outcome = self.delivery.deliver(&event).await;
        tracing::info!(prompt_id = %job_id, outcome = %outcome, "Completion reported");

        Resolution::Reported { event, outcome }
    }

    /// Number of prompts awaiting completion.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Whether `job_id` is currently tracked.
    pub async fn is_pending(&self, job_id: &str) -> bool {
        self.pending.lock().await.contains_key(job_id)
    }
}

/// Build the `workflow_completed` event for a resolved prompt.
///
/// Any artifact means `"success"` with `image_names`; none means
/// `"failed"` with an `error_message`.
pub fn build_completion_event(entry: &CorrelationEntry, artifacts: Vec<String>) -> DeliveryEvent {
    let event = DeliveryEvent::new(WORKFLOW_COMPLETED)
        .with_field("client_id", entry.submitter_id.as_str())
        .with_field("prompt_id", entry.job_id.as_str());

    if artifacts.is_empty() {
        event
            .with_field("status", "failed")
            .with_field("error_message", NO_IMAGES_MESSAGE)
    } else {
        event
            .with_field("status", "success")
            .with_field("image_names", artifacts)
    }
}
