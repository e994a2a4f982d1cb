use crate::error::RunnerError;
use crate::lifecycle::LifecycleListener;
use crate::types::InvocationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::CommandSpec;

/// Marker appended to captured standard output when the child was terminated
/// after its timeout elapsed.
pub const TIMEOUT_SENTINEL: &str = "PYRUNNER TIMEOUT";

// ============================================================================
// ExecutionResult - Captured output of one invocation
// ============================================================================

/// Output from one process invocation.
///
/// Exactly one `ExecutionResult` exists per invocation. Text fields hold the
/// captured lines joined with `\n` and trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output (contains [`TIMEOUT_SENTINEL`] after a timeout)
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Exit code reported by the process (`128 + signal` for signalled Unix processes)
    pub exit_code: i32,
    /// Whether the process was terminated after the timeout elapsed
    pub timed_out: bool,
    /// When the process was spawned
    pub started_at: DateTime<Utc>,
    /// When the exit was observed
    pub exited_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Create a result stamped with the current time.
    ///
    /// Mostly useful for [`ProcessRunner`] test doubles.
    #[must_use]
    pub fn new(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: i32,
        timed_out: bool,
    ) -> Self {
        let now = Utc::now();
        Self::from_captured(stdout.into(), stderr.into(), exit_code, timed_out, now, now)
    }

    /// Build a result from raw accumulator contents, trimming both streams.
    #[must_use]
    pub fn from_captured(
        stdout: String,
        stderr: String,
        exit_code: i32,
        timed_out: bool,
        started_at: DateTime<Utc>,
        exited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            exit_code,
            timed_out,
            started_at,
            exited_at,
        }
    }

    /// Whether the process wrote any non-whitespace text to standard error.
    #[must_use]
    pub fn has_error_output(&self) -> bool {
        !self.stderr.trim().is_empty()
    }

    /// Whether the process exited with code 0, in time, without error output.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out && !self.has_error_output()
    }

    /// Terminal state reached by the invocation.
    #[must_use]
    pub const fn state(&self) -> InvocationState {
        if self.timed_out {
            InvocationState::TimedOut
        } else {
            InvocationState::Completed
        }
    }

    /// Wall-clock time between spawn and observed exit.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.exited_at - self.started_at
    }

    /// Classify the invocation and return its standard output.
    ///
    /// A timed-out invocation returns its output (ending in the sentinel) even
    /// when standard error has content. Otherwise any standard error text is a
    /// [`RunnerError::ScriptFailed`]; the exit code is not consulted.
    pub fn into_text(self) -> Result<String, RunnerError> {
        if self.timed_out {
            return Ok(self.stdout);
        }

        if self.has_error_output() {
            return Err(RunnerError::ScriptFailed {
                stderr: self.stderr,
            });
        }

        Ok(self.stdout)
    }
}

/// Trait for process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string evaluation)
/// and MUST own the output accumulators of each call exclusively, so one
/// implementation value can serve overlapping invocations.
///
/// # Threading
///
/// `ProcessRunner` is a synchronous interface: `run` blocks the caller until
/// the child exits or is terminated. Async callers dispatch it to a blocking
/// worker.
///
/// # Contract
///
/// * `listener.on_started` fires once, after a successful spawn.
/// * `listener.on_exited` fires once, after the exit is observed (normal or forced).
/// * A spawn failure fires neither.
///
/// # Example
///
/// ```rust
/// use pyrunner_runner::{CommandSpec, ExecutionResult, LifecycleListener, ProcessRunner, RunnerError};
/// use std::time::Duration;
///
/// struct EchoRunner;
///
/// impl ProcessRunner for EchoRunner {
///     fn run(
///         &self,
///         cmd: &CommandSpec,
///         _timeout: Duration,
///         _listener: &dyn LifecycleListener,
///     ) -> Result<ExecutionResult, RunnerError> {
///         let joined: Vec<String> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
///         Ok(ExecutionResult::new(joined.join(" "), "", 0, false))
///     }
/// }
///
/// let result = EchoRunner
///     .run(&CommandSpec::new("python3").arg("hello"), Duration::from_secs(1), &pyrunner_runner::Listeners::new())
///     .unwrap();
/// assert_eq!(result.stdout, "hello");
/// ```
pub trait ProcessRunner: Send + Sync {
    /// Execute a command with the given timeout, notifying `listener`.
    ///
    /// # Returns
    ///
    /// * `Ok(ExecutionResult)` - The process completed or was terminated at the timeout
    /// * `Err(RunnerError::*)` - The process could not be started or waited on
    fn run(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
        listener: &dyn LifecycleListener,
    ) -> Result<ExecutionResult, RunnerError>;
}
