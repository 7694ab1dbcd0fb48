//! Processing stage enum and status value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The coarse-grained stage of a task's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// The task is being prepared (validation, setup).
    Initializing,
    /// The collaborator call is in flight.
    Processing,
    /// The collaborator is producing an artifact file.
    GeneratingArtifact,
    /// The task is finalizing its result.
    Completing,
    /// The task failed.
    Error,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Processing => write!(f, "processing"),
            Self::GeneratingArtifact => write!(f, "generating_artifact"),
            Self::Completing => write!(f, "completing"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl ProcessingStage {
    /// Returns true if the stage ends a task's status stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completing | Self::Error)
    }

    /// Returns true if the stage indicates failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// A progress event emitted while a task is in flight.
///
/// Immutable once created. Progress is monotonically non-decreasing
/// within one task except on `Error`, which may reset it to 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStatus {
    /// The lifecycle stage this event belongs to.
    pub stage: ProcessingStage,

    /// Human-readable description of what is happening.
    pub message: String,

    /// Completion fraction in `[0.0, 1.0]`.
    pub progress: f64,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// Optional diagnostic context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, serde_json::Value>,
}

impl ProcessingStatus {
    /// Creates a new status event stamped with the current instant.
    ///
    /// Progress is clamped into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(stage: ProcessingStage, message: impl Into<String>, progress: f64) -> Self {
        Self {
            stage,
            message: message.into(),
            progress: progress.clamp(0.0, 1.0),
            timestamp: Utc::now(),
            details: HashMap::new(),
        }
    }

    /// Adds a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Adds a full detail map, merging over any existing entries.
    #[must_use]
    pub fn with_details(mut self, details: HashMap<String, serde_json::Value>) -> Self {
        self.details.extend(details);
        self
    }
}
