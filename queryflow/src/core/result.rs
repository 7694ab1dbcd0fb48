//! Task result returned from executor submissions.

use super::status::ProcessingStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// The outcome of one query-to-result cycle.
///
/// The executor exclusively owns the lifecycle of a result; no other
/// component mutates it after assembly. A result is produced for every
/// submission, including validation failures and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Unique id of the submission this result belongs to.
    pub task_id: Uuid,

    /// Response payload. Empty on failure.
    pub text: String,

    /// Whether the task completed successfully.
    pub success: bool,

    /// Failure description, present iff `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Absolute paths of artifact files created during this task,
    /// newest first. Empty unless the task succeeded.
    #[serde(default)]
    pub generated_artifacts: Vec<PathBuf>,

    /// Wall-clock seconds from submission to resolution, failure paths
    /// included.
    pub processing_time_seconds: f64,

    /// Status events emitted during this task, in emission order.
    #[serde(default)]
    pub status_history: Vec<ProcessingStatus>,
}

impl TaskResult {
    /// Creates a successful result.
    #[must_use]
    pub fn succeeded(
        task_id: Uuid,
        text: impl Into<String>,
        generated_artifacts: Vec<PathBuf>,
        processing_time_seconds: f64,
    ) -> Self {
        Self {
            task_id,
            text: text.into(),
            success: true,
            error_message: None,
            generated_artifacts,
            processing_time_seconds: processing_time_seconds.max(0.0),
            status_history: Vec::new(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(
        task_id: Uuid,
        error_message: impl Into<String>,
        processing_time_seconds: f64,
    ) -> Self {
        Self {
            task_id,
            text: String::new(),
            success: false,
            error_message: Some(error_message.into()),
            generated_artifacts: Vec::new(),
            processing_time_seconds: processing_time_seconds.max(0.0),
            status_history: Vec::new(),
        }
    }

    /// Attaches the status events collected during this task.
    #[must_use]
    pub fn with_status_history(mut self, history: Vec<ProcessingStatus>) -> Self {
        self.status_history = history;
        self
    }

    /// Returns true if the task produced at least one artifact.
    #[must_use]
    pub fn has_artifacts(&self) -> bool {
        !self.generated_artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::ProcessingStage;

    #[test]
    fn test_succeeded_result() {
        let id = Uuid::new_v4();
        let result = TaskResult::succeeded(id, "OK", vec![PathBuf::from("/tmp/a.png")], 1.25);

        assert!(result.success);
        assert_eq!(result.text, "OK");
        assert!(result.error_message.is_none());
        assert!(result.has_artifacts());
        assert!((result.processing_time_seconds - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_result() {
        let result = TaskResult::failed(Uuid::new_v4(), "boom", 0.5);

        assert!(!result.success);
        assert!(result.text.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("boom"));
        assert!(!result.has_artifacts());
    }

    #[test]
    fn test_processing_time_never_negative() {
        let result = TaskResult::failed(Uuid::new_v4(), "boom", -3.0);
        assert!(result.processing_time_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_status_history() {
        let history = vec![
            ProcessingStatus::new(ProcessingStage::Initializing, "start", 0.1),
            ProcessingStatus::new(ProcessingStage::Completing, "done", 1.0),
        ];
        let result =
            TaskResult::succeeded(Uuid::new_v4(), "OK", Vec::new(), 0.1).with_status_history(history);

        assert_eq!(result.status_history.len(), 2);
        assert_eq!(result.status_history[0].stage, ProcessingStage::Initializing);
    }

    #[test]
    fn test_result_serialization_roundtrip() {
        let result = TaskResult::succeeded(Uuid::new_v4(), "OK", Vec::new(), 2.0);
        let json = serde_json::to_string(&result).unwrap();
        let back: TaskResult = serde_json::from_str(&json).unwrap();

        assert_eq!(back.task_id, result.task_id);
        assert!(back.success);
        assert!(back.error_message.is_none());
    }
}
