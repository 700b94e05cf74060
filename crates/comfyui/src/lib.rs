//! ComfyUI prompt correlation and completion reporting.
//!
//! Tracks which client queued each prompt, and when the prompt finishes
//! reports a `workflow_completed` event listing its output images.

pub mod error;
pub mod hooks;
pub mod payload;
pub mod queue;
pub mod tracker;

pub use error::HookError;
pub use hooks::QueueObserver;
pub use payload::{CompletionPayload, ImageRef, NodeOutput};
pub use queue::{ExtraData, PromptRequest, QueueItem};
pub use tracker::{CorrelationEntry, CorrelationTracker, Resolution};
