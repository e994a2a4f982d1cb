use std::fmt;

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;

    /// Render message, context and suggestions as a multi-line report.
    fn display_for_user(&self) -> String {
        let mut report = format!("Error [{}]: {}", self.category(), self.user_message());

        if let Some(context) = self.context() {
            report.push_str("\n\n");
            report.push_str(&context);
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            report.push_str("\n\nSuggestions:");
            for suggestion in suggestions {
                report.push_str("\n  - ");
                report.push_str(&suggestion);
            }
        }

        report
    }
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Precondition,
    ScriptExecution,
    ProcessHost,
    Environment,
    Cancellation,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Precondition => write!(f, "Precondition"),
            Self::ScriptExecution => write!(f, "Script Execution"),
            Self::ProcessHost => write!(f, "Process Host"),
            Self::Environment => write!(f, "Environment"),
            Self::Cancellation => write!(f, "Cancellation"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}
