//! Executor configuration.

use crate::artifacts::watcher::DEFAULT_ARTIFACT_DIR;
use std::path::PathBuf;
use std::time::Duration;

/// Default await timeout for asynchronous submissions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Minimum accepted query length, in characters, after trimming.
pub const MIN_QUERY_CHARS: usize = 3;

/// Maximum accepted query length, in characters, after trimming.
pub const MAX_QUERY_CHARS: usize = 5000;

/// Configuration for a [`TaskExecutor`].
///
/// [`TaskExecutor`]: super::TaskExecutor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Default timeout applied by `submit_async`.
    pub timeout: Duration,
    /// Directory watched for collaborator file outputs.
    pub artifact_dir: PathBuf,
    /// Minimum trimmed query length, in characters.
    pub min_query_chars: usize,
    /// Maximum trimmed query length, in characters.
    pub max_query_chars: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            min_query_chars: MIN_QUERY_CHARS,
            max_query_chars: MAX_QUERY_CHARS,
        }
    }
}

impl ExecutorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default async timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the watched artifact directory.
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Sets the accepted query length bounds, in trimmed characters.
    #[must_use]
    pub fn with_query_bounds(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.min_query_chars = min_chars;
        self.max_query_chars = max_chars;
        self
    }
}
