//! Error types for runner module

use std::io;
use std::path::PathBuf;

use pyrunner_utils::{ErrorCategory, UserFriendlyError};
use thiserror::Error;

/// Invocation errors raised by the run primitive and the script facade.
///
/// A timeout is deliberately absent: a timed-out invocation completes through
/// the normal path with [`crate::TIMEOUT_SENTINEL`] in its output.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Script file is required")]
    ScriptNotSpecified,

    #[error("Script file not found: {}", .path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Script reported an error: {stderr}")]
    ScriptFailed { stderr: String },

    #[error("Failed to start process '{program}'")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for process '{program}'")]
    WaitFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to capture {stream} of process '{program}'")]
    StreamUnavailable { program: String, stream: &'static str },

    #[error("Process monitor for '{program}' terminated unexpectedly")]
    MonitorLost { program: String },

    #[error("Invocation cancelled before the process was started")]
    Cancelled,

    #[error("Background task failed: {reason}")]
    TaskFailed { reason: String },
}

impl RunnerError {
    /// True for failures that happened before any process was spawned.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::ScriptNotSpecified | Self::ScriptNotFound { .. })
    }

    /// True for failures of the host while starting or waiting on the process.
    #[must_use]
    pub const fn is_host_failure(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed { .. }
                | Self::WaitFailed { .. }
                | Self::StreamUnavailable { .. }
                | Self::MonitorLost { .. }
                | Self::TaskFailed { .. }
        )
    }
}

impl UserFriendlyError for RunnerError {
    fn user_message(&self) -> String {
        match self {
            Self::ScriptNotSpecified => "No script was given to execute".to_string(),
            Self::ScriptNotFound { path } => {
                format!("Script file does not exist: {}", path.display())
            }
            Self::ScriptFailed { stderr } => format!("The script reported an error:\n{stderr}"),
            Self::SpawnFailed { program, source } => {
                format!("Could not start '{program}': {source}")
            }
            Self::WaitFailed { program, source } => {
                format!("Lost track of '{program}' while waiting for it: {source}")
            }
            Self::StreamUnavailable { program, stream } => {
                format!("Could not capture {stream} of '{program}'")
            }
            Self::MonitorLost { program } => {
                format!("The monitor thread for '{program}' stopped unexpectedly")
            }
            Self::Cancelled => "The invocation was cancelled before it started".to_string(),
            Self::TaskFailed { reason } => format!("The background task failed: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ScriptNotSpecified | Self::ScriptNotFound { .. } => Some(
                "Relative script paths are resolved against the configured working directory."
                    .to_string(),
            ),
            Self::ScriptFailed { .. } => Some(
                "Any text written to standard error is treated as a failure, regardless of the exit code."
                    .to_string(),
            ),
            Self::Cancelled => Some(
                "Cancellation is only honoured before the process is spawned; running processes stop at their timeout."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ScriptNotSpecified => vec!["Pass the path of the script to execute".to_string()],
            Self::ScriptNotFound { .. } => vec![
                "Check the script path for typos".to_string(),
                "Set the working directory if the path is relative".to_string(),
            ],
            Self::ScriptFailed { .. } => vec![
                "Fix the exception reported by the script".to_string(),
                "Suppress benign warnings inside the script, e.g. warnings.simplefilter(\"ignore\")"
                    .to_string(),
            ],
            Self::SpawnFailed { .. } => vec![
                "Verify the interpreter path exists and is executable".to_string(),
                "Check the working directory exists".to_string(),
            ],
            Self::WaitFailed { .. } | Self::StreamUnavailable { .. } | Self::MonitorLost { .. } => {
                vec!["Retry the invocation; check system resource limits".to_string()]
            }
            Self::Cancelled => vec![],
            Self::TaskFailed { .. } => {
                vec!["Run the synchronous variant to see the underlying failure".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ScriptNotSpecified | Self::ScriptNotFound { .. } => ErrorCategory::Precondition,
            Self::ScriptFailed { .. } => ErrorCategory::ScriptExecution,
            Self::Cancelled => ErrorCategory::Cancellation,
            _ => ErrorCategory::ProcessHost,
        }
    }
}
