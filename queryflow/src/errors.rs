//! Internal error type for the task execution path.
//!
//! These errors never escape the executor's public entry points; they
//! are converted into failed [`TaskResult`]s after classification.
//!
//! [`TaskResult`]: crate::core::TaskResult

use crate::classifier::ErrorCategory;
use thiserror::Error;

/// A failure on the query-to-result path.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The query failed boundary validation.
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        /// Why the query was rejected.
        reason: String,
    },

    /// The executor never finished initialization.
    #[error("Executor is not initialized. Check your configuration and try again.")]
    NotInitialized,

    /// The asynchronous wait gave up before the worker finished.
    #[error("Query processing timed out after {seconds} seconds. Try a simpler query or increase the timeout.")]
    Timeout {
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The collaborator call itself failed.
    #[error("{0}")]
    Collaborator(anyhow::Error),

    /// The worker task was lost before producing a result.
    #[error("Worker task failed before completing: {reason}")]
    WorkerLost {
        /// Join failure description.
        reason: String,
    },
}

impl TaskError {
    /// The taxonomy category this error maps to when no better hint is
    /// available. Collaborator failures default to `agent`; the
    /// classifier may still reclassify them from the error text.
    #[must_use]
    pub fn default_category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQuery { .. } => ErrorCategory::Validation,
            Self::NotInitialized => ErrorCategory::Configuration,
            Self::Timeout { .. } => ErrorCategory::Network,
            Self::Collaborator(_) => ErrorCategory::Agent,
            Self::WorkerLost { .. } => ErrorCategory::Unknown,
        }
    }
}
