use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Default bound for script invocations.
pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 60_000;

/// Default bound for environment setup steps (package installs are slow).
pub const DEFAULT_SETUP_TIMEOUT_MS: u64 = 120_000;

/// Convert a millisecond timeout into a `Duration`.
///
/// Negative values are rejected; 0 selects `default_ms`.
pub(crate) fn timeout_from_millis(
    key: &str,
    millis: i64,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    if millis < 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: format!("must not be negative (got {millis})"),
        });
    }

    let millis = u64::try_from(millis).unwrap_or(default_ms);
    if millis == 0 {
        Ok(Duration::from_millis(default_ms))
    } else {
        Ok(Duration::from_millis(millis))
    }
}

/// Parse a millisecond timeout from text (environment variables, CLI).
pub(crate) fn parse_timeout_ms(key: &str, raw: &str) -> Result<i64, ConfigError> {
    let millis = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: format!("'{raw}' is not a whole number of milliseconds"),
        })?;

    if millis < 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: format!("must not be negative (got {millis})"),
        });
    }

    Ok(millis)
}

/// Check that an interpreter path points at an existing file.
pub(crate) fn existing_interpreter(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ConfigError::InterpreterNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Whether `path` names the Windows Python launcher (`py.exe`).
#[must_use]
pub fn is_launcher(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case("py.exe"))
}
