//! Deterministic user-facing messaging and category inference.
//!
//! Keyword matching on error text is a best-effort heuristic layer,
//! not a correctness-critical one; call sites that know better supply
//! an explicit category on their [`FailureReport`].
//!
//! [`FailureReport`]: super::record::FailureReport

use super::record::{ErrorCategory, ErrorSeverity};

/// Default severity for failures in each category.
#[must_use]
pub fn default_severity(category: ErrorCategory) -> ErrorSeverity {
    match category {
        ErrorCategory::Agent | ErrorCategory::Configuration => ErrorSeverity::High,
        ErrorCategory::Artifact => ErrorSeverity::Low,
        ErrorCategory::Validation
        | ErrorCategory::Network
        | ErrorCategory::Filesystem
        | ErrorCategory::Ui
        | ErrorCategory::Unknown => ErrorSeverity::Medium,
    }
}

/// Infers a category from an error's text when the call site did not
/// supply one.
#[must_use]
pub fn infer_category(raw_message: &str) -> ErrorCategory {
    let lower = raw_message.to_lowercase();

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("unreachable")
    {
        return ErrorCategory::Network;
    }

    if lower.contains("permission")
        || lower.contains("not found")
        || lower.contains("no such file")
        || lower.contains("disk")
        || lower.contains("read-only")
    {
        return ErrorCategory::Filesystem;
    }

    if lower.contains("invalid") || lower.contains("must be between") {
        return ErrorCategory::Validation;
    }

    ErrorCategory::Unknown
}

/// Generates the short, category-appropriate sentence shown to users.
///
/// Keyword-sensitive within a category; unmatched keywords fall back to
/// a generic category sentence. Deterministic for a given input.
#[must_use]
pub fn user_message(category: ErrorCategory, raw_message: &str, user_context: &str) -> String {
    let lower = raw_message.to_lowercase();

    let sentence = match category {
        ErrorCategory::Filesystem => {
            if lower.contains("permission") {
                "Unable to access a file due to permission restrictions."
            } else if lower.contains("not found") || lower.contains("no such file") {
                "A required file could not be found."
            } else if lower.contains("disk") || lower.contains("space") {
                "There is not enough disk space for the operation."
            } else {
                "A file system error occurred."
            }
        }
        ErrorCategory::Artifact => {
            if lower.contains("image") {
                "Unable to load or display the artifact image."
            } else if lower.contains("format") {
                "The artifact file format is not supported."
            } else {
                "An error occurred while processing the artifact."
            }
        }
        ErrorCategory::Agent => {
            if lower.contains("timeout") || lower.contains("timed out") {
                "The request took too long to process."
            } else if lower.contains("connection") || lower.contains("network") {
                "Unable to connect to the agent service."
            } else if lower.contains("auth") {
                "Authentication failed. Check your credentials."
            } else {
                "The agent encountered an error while processing the request."
            }
        }
        ErrorCategory::Network => {
            if lower.contains("timeout") || lower.contains("timed out") {
                "The operation timed out waiting for a response."
            } else {
                "A network error prevented the operation from completing."
            }
        }
        ErrorCategory::Validation => "The input provided is not valid.",
        ErrorCategory::Configuration => "There is a configuration issue that needs to be resolved.",
        ErrorCategory::Ui => "A display error occurred.",
        ErrorCategory::Unknown => "An unexpected error occurred.",
    };

    if user_context.is_empty() {
        sentence.to_string()
    } else {
        format!("{sentence} {user_context}")
    }
}

/// Canned recovery suggestions for each category. Call sites may append
/// their own before these but never remove them.
#[must_use]
pub fn default_suggestions(category: ErrorCategory) -> Vec<String> {
    let suggestions: &[&str] = match category {
        ErrorCategory::Filesystem => &[
            "Check file permissions and access rights",
            "Verify the file path is correct",
            "Ensure sufficient disk space is available",
        ],
        ErrorCategory::Artifact => &[
            "Check if the artifact file exists",
            "Verify the file format is supported",
            "Try regenerating the artifact",
        ],
        ErrorCategory::Agent => &[
            "Check your internet connection",
            "Try again in a few moments",
            "Verify your configuration settings",
        ],
        ErrorCategory::Network => &[
            "Check your network connectivity",
            "Retry shortly",
        ],
        ErrorCategory::Validation => &[
            "Check your input format",
            "Review the input requirements",
        ],
        ErrorCategory::Configuration => &[
            "Check your configuration settings",
            "Verify all required dependencies are installed",
            "Restart the application",
        ],
        ErrorCategory::Ui | ErrorCategory::Unknown => &[
            "Try refreshing the application",
            "Contact support if the issue persists",
        ],
    };

    suggestions.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_per_category() {
        assert_eq!(default_severity(ErrorCategory::Agent), ErrorSeverity::High);
        assert_eq!(
            default_severity(ErrorCategory::Configuration),
            ErrorSeverity::High
        );
        assert_eq!(default_severity(ErrorCategory::Artifact), ErrorSeverity::Low);
        assert_eq!(
            default_severity(ErrorCategory::Filesystem),
            ErrorSeverity::Medium
        );
    }

    #[test]
    fn test_infer_category_network() {
        assert_eq!(infer_category("connection refused"), ErrorCategory::Network);
        assert_eq!(
            infer_category("request timed out after 30s"),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_infer_category_filesystem() {
        assert_eq!(
            infer_category("permission denied (os error 13)"),
            ErrorCategory::Filesystem
        );
        assert_eq!(
            infer_category("No such file or directory"),
            ErrorCategory::Filesystem
        );
    }

    #[test]
    fn test_infer_category_fallback() {
        assert_eq!(infer_category("something odd happened"), ErrorCategory::Unknown);
    }

    #[test]
    fn test_user_message_keyword_sensitivity() {
        let msg = user_message(ErrorCategory::Filesystem, "permission denied", "");
        assert!(msg.contains("permission restrictions"));

        let msg = user_message(ErrorCategory::Filesystem, "file not found", "");
        assert!(msg.contains("could not be found"));

        let msg = user_message(ErrorCategory::Filesystem, "EIO", "");
        assert_eq!(msg, "A file system error occurred.");
    }

    #[test]
    fn test_user_message_is_deterministic() {
        let a = user_message(ErrorCategory::Agent, "connection reset by peer", "Query failed.");
        let b = user_message(ErrorCategory::Agent, "connection reset by peer", "Query failed.");
        assert_eq!(a, b);
        assert!(a.ends_with("Query failed."));
    }

    #[test]
    fn test_default_suggestions_nonempty_for_all_categories() {
        for category in [
            ErrorCategory::Validation,
            ErrorCategory::Network,
            ErrorCategory::Filesystem,
            ErrorCategory::Artifact,
            ErrorCategory::Agent,
            ErrorCategory::Configuration,
            ErrorCategory::Ui,
            ErrorCategory::Unknown,
        ] {
            assert!(!default_suggestions(category).is_empty());
        }
    }
}
