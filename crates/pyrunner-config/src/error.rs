//! Configuration errors

use std::io;
use std::path::PathBuf;

use pyrunner_utils::{ErrorCategory, UserFriendlyError};
use thiserror::Error;

/// Configuration failures. All of them are raised before any process starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Interpreter not found: {}", .path.display())]
    InterpreterNotFound { path: PathBuf },

    #[error("No default Python interpreter could be located")]
    NoDefaultInterpreter,

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid configuration file {}: {reason}", .path.display())]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Failed to read configuration file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InterpreterNotFound { path } => {
                format!("The interpreter '{}' does not exist", path.display())
            }
            Self::NoDefaultInterpreter => {
                "No Python interpreter was found at the system location or on PATH".to_string()
            }
            Self::InvalidValue { key, value } => format!("Configuration key '{key}' {value}"),
            Self::NotFound { path } => {
                format!("Configuration file '{}' does not exist", path.display())
            }
            Self::InvalidFile { path, reason } => {
                format!("Could not parse '{}': {reason}", path.display())
            }
            Self::Io { path, source } => {
                format!("Could not read '{}': {source}", path.display())
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InterpreterNotFound { .. } | Self::NoDefaultInterpreter => Some(
                "The interpreter path is checked once, when the configuration is created."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } if key.ends_with("timeout_ms") => Some(
                "Timeouts are milliseconds; 0 selects the built-in default.".to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InterpreterNotFound { .. } => vec![
                "Pass an absolute path with --interpreter".to_string(),
                "Set PYRUNNER_INTERPRETER or [runner].interpreter in pyrunner.toml".to_string(),
            ],
            Self::NoDefaultInterpreter => vec![
                "Install Python 3 or add it to PATH".to_string(),
                "Pass the interpreter path explicitly with --interpreter".to_string(),
            ],
            Self::InvalidValue { .. } => {
                vec!["Correct the value and try again".to_string()]
            }
            Self::NotFound { .. } => {
                vec!["Check the path given to --config".to_string()]
            }
            Self::InvalidFile { .. } => vec![
                "Check the TOML syntax".to_string(),
                "Only [runner] and [environment] sections are recognised".to_string(),
            ],
            Self::Io { .. } => vec!["Check file permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } => ErrorCategory::FileSystem,
            _ => ErrorCategory::Configuration,
        }
    }
}
