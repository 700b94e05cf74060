//! Observer interface invoked by the host queue.
//!
//! The host calls these on its own submission and completion paths. Every
//! method absorbs its own failures: problems are logged and the host never
//! sees an error.

use async_trait::async_trait;

use crate::payload::CompletionPayload;
use crate::queue::{PromptRequest, QueueItem};
use crate::tracker::{CorrelationTracker, Resolution};

/// Receives prompt queue events from the host.
#[async_trait]
pub trait QueueObserver: Send + Sync {
    /// A `/prompt` request was accepted. Returns whether it was registered.
    async fn on_prompt_request(&self, request: &PromptRequest) -> bool;

    /// An item was put on the prompt queue. Returns whether it was registered.
    async fn on_put(&self, item: &QueueItem) -> bool;

    /// A queue item finished. `prompt_id` is `None` when the host could not
    /// find the item among its running prompts.
    async fn on_task_done(&self, prompt_id: Option<&str>, payload: &CompletionPayload)
        -> Resolution;
}

#[async_trait]
impl QueueObserver for CorrelationTracker {
    async fn on_prompt_request(&self, request: &PromptRequest) -> bool {
        match request.correlation() {
            Ok(entry) => {
                self.register(entry.job_id, entry.submitter_id).await;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Prompt request not registered");
                false
            }
        }
    }

    async fn on_put(&self, item: &QueueItem) -> bool {
        tracing::info!(number = ?item.number, prompt_id = ?item.prompt_id, "New item added to queue");
        match item.correlation() {
            Ok(entry) => {
                self.register(entry.job_id, entry.submitter_id).await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Queue item not registered");
                false
            }
        }
    }

    async fn on_task_done(
        &self,
        prompt_id: Option<&str>,
        payload: &CompletionPayload,
    ) -> Resolution {
        match prompt_id {
            Some(prompt_id) => self.resolve_and_remove(prompt_id, payload).await,
            None => {
                tracing::warn!("Finished item not found among running prompts");
                Resolution::NotFound
            }
        }
    }
}
