//! Failure classification and bounded error history.
//!
//! The classifier converts arbitrary failures into structured,
//! user-safe [`ErrorRecord`]s and keeps the most recent records in a
//! fixed-capacity ring buffer. Classification itself never fails: any
//! internal surprise degrades to an unknown/medium record that still
//! preserves the original error text.

pub mod messages;
pub mod record;

pub use record::{ErrorCategory, ErrorRecord, ErrorSeverity, FailureReport};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::collections::hash_map::Entry;
use tracing::{error, info, warn};

/// Default capacity of the error history ring buffer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Aggregate counts over the current history buffer contents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorStatistics {
    /// Number of records currently held.
    pub total_errors: usize,
    /// Counts grouped by category name.
    pub by_category: HashMap<String, usize>,
    /// Counts grouped by severity name.
    pub by_severity: HashMap<String, usize>,
    /// Counts grouped by reporting component.
    pub by_component: HashMap<String, usize>,
    /// Timestamp of the most recent record, if any.
    pub most_recent: Option<DateTime<Utc>>,
}

/// Converts failures into records and owns their bounded history.
///
/// The history may be appended from more than one thread (validation
/// errors on the caller's thread, agent errors from the worker), so all
/// access goes through an internal lock.
pub struct ErrorClassifier {
    history: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ErrorClassifier {
    /// Creates a classifier with the given history capacity.
    ///
    /// A zero capacity is bumped to one so the most recent failure is
    /// always observable.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Classifies a failure and appends the record to the history.
    ///
    /// Category falls back to text inference when the report carries no
    /// hint; severity falls back to the category default. Call-site
    /// suggestions come before the category's canned list.
    pub fn record(&self, report: FailureReport) -> ErrorRecord {
        let category = report
            .category
            .unwrap_or_else(|| messages::infer_category(&report.raw_message));
        let severity = report
            .severity
            .unwrap_or_else(|| messages::default_severity(category));

        let mut recovery_suggestions = report.extra_suggestions;
        recovery_suggestions.extend(messages::default_suggestions(category));

        let record = ErrorRecord {
            category,
            severity,
            user_message: messages::user_message(category, &report.raw_message, &report.user_context),
            raw_message: report.raw_message,
            component: report.component,
            timestamp: Utc::now(),
            recovery_suggestions,
        };

        self.log_record(&record);
        self.append(record.clone());
        record
    }

    /// Records a collaborator failure, tagged `agent`/high by default.
    ///
    /// Mirrors the executor's primary failure path: the query text is
    /// truncated into the user context for correlation.
    pub fn record_agent_failure(&self, error: &dyn std::fmt::Display, query: &str) -> ErrorRecord {
        let preview: String = query.chars().take(50).collect();
        let context = if query.chars().count() > 50 {
            format!("Agent processing failed for query: {preview}...")
        } else {
            format!("Agent processing failed for query: {preview}")
        };

        self.record(
            FailureReport::new(error, "task_executor")
                .with_category(ErrorCategory::Agent)
                .with_user_context(context)
                .with_suggestion("Try a simpler query"),
        )
    }

    /// Records a filesystem failure for a named operation.
    pub fn record_filesystem_failure(
        &self,
        error: &dyn std::fmt::Display,
        operation: &str,
        path: Option<&std::path::Path>,
    ) -> ErrorRecord {
        let context = match path.and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
            Some(name) => format!("File operation '{operation}' failed for file: {name}"),
            None => format!("File operation '{operation}' failed"),
        };

        self.record(
            FailureReport::new(error, "artifact_watcher")
                .with_category(ErrorCategory::Filesystem)
                .with_user_context(context),
        )
    }

    /// Records an artifact-handling failure, tagged low severity.
    pub fn record_artifact_failure(
        &self,
        error: &dyn std::fmt::Display,
        artifact_name: &str,
    ) -> ErrorRecord {
        let context = if artifact_name.is_empty() {
            "Artifact processing failed".to_string()
        } else {
            format!("Artifact processing failed for: {artifact_name}")
        };

        self.record(
            FailureReport::new(error, "artifact_watcher")
                .with_category(ErrorCategory::Artifact)
                .with_user_context(context),
        )
    }

    /// Returns up to `limit` of the most recent records, oldest first.
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<ErrorRecord> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Returns counts grouped over the current buffer contents.
    #[must_use]
    pub fn statistics(&self) -> ErrorStatistics {
        let history = self.history.lock();
        let mut stats = ErrorStatistics {
            total_errors: history.len(),
            most_recent: history.back().map(|r| r.timestamp),
            ..ErrorStatistics::default()
        };

        for record in history.iter() {
            bump(&mut stats.by_category, record.category.to_string());
            bump(&mut stats.by_severity, record.severity.to_string());
            bump(&mut stats.by_component, record.component.clone());
        }

        stats
    }

    /// Empties the history buffer.
    pub fn clear(&self) {
        self.history.lock().clear();
        info!("error history cleared");
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    fn append(&self, record: ErrorRecord) {
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(record);
    }

    fn log_record(&self, record: &ErrorRecord) {
        match record.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                category = %record.category,
                component = %record.component,
                "{}",
                record.raw_message
            ),
            ErrorSeverity::Medium => warn!(
                category = %record.category,
                component = %record.component,
                "{}",
                record.raw_message
            ),
            ErrorSeverity::Low => info!(
                category = %record.category,
                component = %record.component,
                "{}",
                record.raw_message
            ),
        }
    }
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

fn bump(counts: &mut HashMap<String, usize>, key: String) {
    match counts.entry(key) {
        Entry::Occupied(mut entry) => *entry.get_mut() += 1,
        Entry::Vacant(entry) => {
            entry.insert(1);
        }
    }
}
