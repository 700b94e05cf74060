//! Errors raised while interpreting host hook calls.
//!
//! None of these ever reach the host: hook entry points log them and
//! carry on.

/// Problems with an inbound hook call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// A submission did not identify both the job and its submitter.
    #[error("Missing client_id or prompt_id (prompt_id={job_id:?}, client_id={submitter_id:?})")]
    MissingCorrelationData {
        job_id: Option<String>,
        submitter_id: Option<String>,
    },

    /// A completion referenced a job that was never registered.
    #[error("prompt_id {0} not found in correlation map")]
    UnknownJob(String),

    /// A queue item did not have the `[number, prompt_id, prompt, extra_data, ...]` shape.
    #[error("Malformed queue item: {0}")]
    MalformedQueueItem(String),
}
