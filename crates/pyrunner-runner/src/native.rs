use crate::error::RunnerError;
use crate::io::spawn_line_reader;
use crate::lifecycle::LifecycleListener;
use crate::platform::terminate_process;
use crate::types::InvocationState;
use chrono::Utc;
use pyrunner_utils::logging::invocation_span;
use std::io;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{CommandSpec, ExecutionResult, ProcessRunner, TIMEOUT_SENTINEL};

/// How often the waiter checks for exit between kill requests.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// NativeRunner - Native process execution with bounded waiting
// ============================================================================

/// Native process runner using `std::process::Command`.
///
/// Arguments travel as discrete argv elements; nothing is evaluated by a
/// shell. Both output streams are drained concurrently by reader threads so a
/// chatty child cannot block on a full pipe, and a waiter thread owns the
/// child so the caller can bound the wait with `recv_timeout`. The waiter is
/// also the only thread that kills or reaps the child.
///
/// When the timeout elapses the child is killed, the runner waits (without a
/// bound) for the exit to be observed, and [`TIMEOUT_SENTINEL`] is appended
/// to standard output before `Exited` fires.
///
/// # Example
///
/// ```rust,no_run
/// use pyrunner_runner::{CommandSpec, Listeners, NativeRunner, ProcessRunner};
/// use std::time::Duration;
///
/// let runner = NativeRunner::new();
/// let cmd = CommandSpec::new("/usr/bin/python3").arg("-c").arg("print('A')");
///
/// let output = runner.run(&cmd, Duration::from_secs(30), &Listeners::new()).unwrap();
/// assert_eq!(output.stdout, "A");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl NativeRunner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessRunner for NativeRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
        listener: &dyn LifecycleListener,
    ) -> Result<ExecutionResult, RunnerError> {
        let program = cmd.program_display();
        let span = invocation_span(&program, cmd.args.len(), timeout.as_millis());
        let _enter = span.enter();

        let mut state = InvocationState::NotStarted;
        advance(&mut state, InvocationState::Starting);

        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                advance(&mut state, InvocationState::StartFailed);
                tracing::error!(error = %source, "failed to spawn process");
                return Err(RunnerError::SpawnFailed { program, source });
            }
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            advance(&mut state, InvocationState::StartFailed);
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunnerError::StreamUnavailable {
                program,
                stream: "output streams",
            });
        };

        let pid = child.id();
        let started_at = Utc::now();
        advance(&mut state, InvocationState::Running);
        tracing::debug!(pid, "process started");
        listener.on_started(started_at);

        let stdout_reader = spawn_line_reader(stdout, "stdout");
        let stderr_reader = spawn_line_reader(stderr, "stderr");

        let (kill_tx, kill_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let waiter = thread::spawn(move || {
            let _ = tx.send(supervise(child, &kill_rx));
        });

        let (wait_result, timed_out) = match rx.recv_timeout(timeout) {
            Ok(result) => (result, false),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    pid,
                    timeout_ms = timeout.as_millis() as u64,
                    "process exceeded timeout, terminating"
                );
                let _ = kill_tx.send(());
                match rx.recv() {
                    Ok(result) => (result, true),
                    Err(_) => {
                        tracing::error!(pid, "process monitor lost after termination");
                        return Err(RunnerError::MonitorLost { program });
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!(pid, "process monitor lost");
                return Err(RunnerError::MonitorLost { program });
            }
        };
        let _ = waiter.join();

        let status = wait_result.map_err(|source| {
            tracing::error!(pid, error = %source, "failed to wait for process");
            RunnerError::WaitFailed {
                program: program.clone(),
                source,
            }
        })?;

        let mut stdout = join_reader(stdout_reader, "stdout");
        let stderr = join_reader(stderr_reader, "stderr");

        if timed_out {
            stdout.push_str(TIMEOUT_SENTINEL);
            stdout.push('\n');
            advance(&mut state, InvocationState::TimedOut);
        } else {
            advance(&mut state, InvocationState::Completed);
        }

        let exit_code = exit_code_of(status);
        let exited_at = Utc::now();
        listener.on_exited(exit_code, exited_at);

        tracing::debug!(
            exit_code,
            timed_out,
            duration_ms = (exited_at - started_at).num_milliseconds(),
            "process exited"
        );

        Ok(ExecutionResult::from_captured(
            stdout, stderr, exit_code, timed_out, started_at, exited_at,
        ))
    }
}

/// Poll `child` until it exits or a kill request arrives on `kill_rx`.
///
/// The child is only ever reaped here, so a kill sent after `try_wait`
/// reported it running cannot reach a recycled pid.
fn supervise(mut child: Child, kill_rx: &mpsc::Receiver<()>) -> io::Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        match kill_rx.recv_timeout(EXIT_POLL_INTERVAL) {
            Ok(()) => {
                terminate_process(&child);
                return child.wait();
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return child.wait(),
        }
    }
}

fn advance(state: &mut InvocationState, next: InvocationState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal invocation transition {state} -> {next}"
    );
    tracing::trace!(from = %state, to = %next, "invocation state");
    *state = next;
}

fn join_reader(handle: JoinHandle<String>, stream: &'static str) -> String {
    handle.join().unwrap_or_else(|_| {
        tracing::warn!(stream, "output reader panicked, captured text discarded");
        String::new()
    })
}

/// Numeric exit code; signalled Unix processes report `128 + signal`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
