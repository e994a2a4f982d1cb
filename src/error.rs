//! Crate-level error type

use std::io;
use std::path::PathBuf;

use pyrunner_config::ConfigError;
use pyrunner_runner::RunnerError;
use pyrunner_utils::{ErrorCategory, ExitCode, UserFriendlyError};
use thiserror::Error;

/// Errors surfaced by [`crate::PythonRunner`], [`crate::EnvironmentBootstrap`]
/// and the CLI.
#[derive(Error, Debug)]
pub enum PyRunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Environment step '{step}' failed with exit code {exit_code}")]
    Bootstrap {
        step: String,
        exit_code: i32,
        timed_out: bool,
        stderr: String,
    },

    #[error("Script output is not a valid base64 payload: {reason}")]
    Payload { reason: String },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PyRunnerError {
    /// Map this error to the CLI exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CONFIG,
            Self::Runner(err) => match err {
                RunnerError::ScriptFailed { .. } => ExitCode::SCRIPT_FAILED,
                RunnerError::Cancelled => ExitCode::CANCELLED,
                e if e.is_precondition() => ExitCode::PRECONDITION,
                _ => ExitCode::RUNNER_FAILURE,
            },
            Self::Bootstrap { timed_out, .. } => {
                if *timed_out {
                    ExitCode::TIMEOUT
                } else {
                    ExitCode::SCRIPT_FAILED
                }
            }
            Self::Payload { .. } => ExitCode::SCRIPT_FAILED,
            Self::Io { .. } => ExitCode::INTERNAL,
        }
    }
}

impl UserFriendlyError for PyRunnerError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Runner(err) => err.user_message(),
            Self::Bootstrap {
                step,
                exit_code,
                timed_out,
                ..
            } => {
                if *timed_out {
                    format!("Environment step '{step}' did not finish before the setup timeout")
                } else {
                    format!("Environment step '{step}' exited with code {exit_code}")
                }
            }
            Self::Payload { reason } => {
                format!("The script did not print a decodable base64 payload: {reason}")
            }
            Self::Io { path, source } => format!("{}: {source}", path.display()),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Runner(err) => err.context(),
            Self::Bootstrap { stderr, .. } if !stderr.is_empty() => {
                Some(format!("Tool output:\n{stderr}"))
            }
            Self::Payload { .. } => Some(
                "Image scripts are expected to print a single base64 payload such as b'iVBORw0...'."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Runner(err) => err.suggestions(),
            Self::Bootstrap { timed_out: true, .. } => vec![
                "Raise [environment].setup_timeout_ms".to_string(),
                "Check network access to the package index".to_string(),
            ],
            Self::Bootstrap { .. } => vec![
                "Check that the requirements file is valid".to_string(),
                "Delete the environment directory and create it again".to_string(),
            ],
            Self::Payload { .. } => {
                vec!["Print base64.b64encode(buffer.getvalue()) as the only output".to_string()]
            }
            Self::Io { .. } => vec!["Check file permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Runner(err) => err.category(),
            Self::Bootstrap { .. } => ErrorCategory::Environment,
            Self::Payload { .. } => ErrorCategory::ScriptExecution,
            Self::Io { .. } => ErrorCategory::FileSystem,
        }
    }
}
