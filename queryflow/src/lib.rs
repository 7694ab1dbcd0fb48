//! # Queryflow
//!
//! An asynchronous facade around a long-running, opaque "agent" call.
//!
//! Queryflow wraps a collaborator function (text query in, text answer
//! out, files as untracked side effects) so that callers get:
//!
//! - **Non-blocking submission**: queries run on a single worker slot,
//!   awaited with a timeout, and never block the caller indefinitely
//! - **Progress broadcasting**: coarse-grained status events delivered
//!   to any number of subscribers while a call is in flight
//! - **Artifact detection by diffing**: the watched directory is
//!   snapshotted before and after each call to discover the files the
//!   collaborator created, since it has no structured output channel
//! - **Error classification**: every failure is mapped into a fixed
//!   taxonomy with user-safe messaging, recovery suggestions, and a
//!   bounded history
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use queryflow::prelude::*;
//! use std::sync::Arc;
//!
//! let agent = |query: &str| -> anyhow::Result<String> {
//!     Ok(format!("answer to {query}"))
//! };
//!
//! let executor = TaskExecutor::new(ExecutorConfig::default(), Arc::new(agent));
//! executor.broadcaster().subscribe_fn(|status| {
//!     println!("[{}] {}", status.stage, status.message);
//! });
//!
//! let result = executor.submit("design a serverless api");
//! assert!(result.success);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifacts;
pub mod classifier;
pub mod core;
pub mod errors;
pub mod executor;
pub mod observability;
pub mod status;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactInfo, ArtifactWatcher, FolderInfo};
    pub use crate::classifier::{
        ErrorCategory, ErrorClassifier, ErrorRecord, ErrorSeverity, ErrorStatistics, FailureReport,
    };
    pub use crate::core::{ProcessingStage, ProcessingStatus, TaskResult};
    pub use crate::errors::TaskError;
    pub use crate::executor::{Collaborator, ExecutorConfig, TaskExecutor};
    pub use crate::status::{
        CollectingSubscriber, StatusBroadcaster, StatusSubscriber, SubscriptionId,
    };
}
