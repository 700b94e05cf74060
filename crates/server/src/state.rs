use std::sync::Arc;

use hookrelay_comfyui::CorrelationTracker;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide prompt tracker.
    pub tracker: Arc<CorrelationTracker>,
}
