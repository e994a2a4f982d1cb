//! Exit code constants for the pyrunner CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CONFIG` | Invalid CLI arguments or configuration |
//! | 3 | `SCRIPT_FAILED` | Script wrote to standard error |
//! | 4 | `PRECONDITION` | Script missing or not specified |
//! | 10 | `TIMEOUT` | Process was terminated after the timeout elapsed |
//! | 70 | `RUNNER_FAILURE` | Process could not be started or waited on |
//! | 130 | `CANCELLED` | Invocation cancelled before the process started |

/// Exit codes matching the documented exit code table.
///
/// # Example
///
/// ```rust
/// use pyrunner_utils::ExitCode;
///
/// assert_eq!(ExitCode::TIMEOUT.as_i32(), 10);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Script ran to completion with nothing on standard error
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Configuration error - invalid interpreter, timeout, config file or CLI arguments
    pub const CONFIG: ExitCode = ExitCode(2);

    /// Script error - the child process wrote to standard error
    pub const SCRIPT_FAILED: ExitCode = ExitCode(3);

    /// Precondition error - script not specified or not found
    pub const PRECONDITION: ExitCode = ExitCode(4);

    /// Timeout - the child process was forcibly terminated
    pub const TIMEOUT: ExitCode = ExitCode(10);

    /// Runner failure - the child process could not be started or waited on
    pub const RUNNER_FAILURE: ExitCode = ExitCode(70);

    /// Cancelled before the child process was spawned
    pub const CANCELLED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
