//! Error taxonomy and the immutable failure record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed, closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input failed the boundary checks.
    Validation,
    /// Connectivity or timeout failure.
    Network,
    /// Missing file, permission, or other I/O failure.
    Filesystem,
    /// Artifact detection or handling failure.
    Artifact,
    /// The collaborator call itself failed.
    Agent,
    /// The system was misconfigured or never finished initializing.
    Configuration,
    /// Presentation-layer failure recorded by a frontend.
    Ui,
    /// Anything that could not be classified.
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Network => write!(f, "network"),
            Self::Filesystem => write!(f, "filesystem"),
            Self::Artifact => write!(f, "artifact"),
            Self::Agent => write!(f, "agent"),
            Self::Configuration => write!(f, "configuration"),
            Self::Ui => write!(f, "ui"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Severity of a recorded failure, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Cosmetic or fully degraded-around failure.
    Low,
    /// Degraded behavior worth surfacing.
    Medium,
    /// A primary operation failed.
    High,
    /// The system is unusable.
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A classified failure. Created once per handled error, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Which part of the taxonomy the failure falls into.
    pub category: ErrorCategory,

    /// How severe the failure is.
    pub severity: ErrorSeverity,

    /// The original error's string representation, kept for debugging.
    pub raw_message: String,

    /// Short, category-appropriate sentence safe to show users.
    pub user_message: String,

    /// The component that reported the failure.
    pub component: String,

    /// When the record was created.
    pub timestamp: DateTime<Utc>,

    /// Recovery hints, call-site specifics first, category defaults after.
    pub recovery_suggestions: Vec<String>,
}

/// Describes one failure to be classified and recorded.
///
/// Call sites supply what they know; everything left unset is inferred
/// or defaulted by the classifier.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub(crate) raw_message: String,
    pub(crate) category: Option<ErrorCategory>,
    pub(crate) severity: Option<ErrorSeverity>,
    pub(crate) component: String,
    pub(crate) user_context: String,
    pub(crate) extra_suggestions: Vec<String>,
}

impl FailureReport {
    /// Creates a report from any displayable error.
    #[must_use]
    pub fn new(error: &dyn fmt::Display, component: impl Into<String>) -> Self {
        Self {
            raw_message: error.to_string(),
            category: None,
            severity: None,
            component: component.into(),
            user_context: String::new(),
            extra_suggestions: Vec::new(),
        }
    }

    /// Supplies an explicit category, bypassing inference.
    #[must_use]
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Overrides the category's default severity.
    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Adds context appended to the user-facing message.
    #[must_use]
    pub fn with_user_context(mut self, context: impl Into<String>) -> Self {
        self.user_context = context.into();
        self
    }

    /// Adds a call-site recovery suggestion, listed before the
    /// category defaults.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.extra_suggestions.push(suggestion.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Artifact.to_string(), "artifact");
        assert_eq!(ErrorCategory::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Filesystem).unwrap();
        assert_eq!(json, r#""filesystem""#);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_report_builder() {
        let err = anyhow::anyhow!("connection refused");
        let report = FailureReport::new(&err, "task_executor")
            .with_category(ErrorCategory::Network)
            .with_severity(ErrorSeverity::High)
            .with_user_context("while contacting the agent")
            .with_suggestion("Retry shortly");

        assert_eq!(report.raw_message, "connection refused");
        assert_eq!(report.category, Some(ErrorCategory::Network));
        assert_eq!(report.severity, Some(ErrorSeverity::High));
        assert_eq!(report.extra_suggestions, vec!["Retry shortly".to_string()]);
    }
}
