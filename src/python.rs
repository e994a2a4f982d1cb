//! Script execution facade over the run primitive

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use pyrunner_config::{ConfigError, RunnerConfiguration};
use pyrunner_runner::{
    ChannelListener, CommandSpec, ExecutionResult, LifecycleEvent, LifecycleListener, Listeners,
    NativeRunner, ProcessRunner, RunnerError,
};
use tokio_util::sync::CancellationToken;

use crate::error::PyRunnerError;
use crate::invocation::Invocation;
use crate::payload::decode_payload;

/// Runs Python scripts (or the bare interpreter) with captured output.
///
/// Each call builds the argument vector
/// `launcher args -> interpreter args -> script -> script arguments`
/// from the current configuration and hands it to the backend
/// [`ProcessRunner`]. Output accumulators belong to a single call, so clones
/// of one runner may execute concurrently; lifecycle events of overlapping
/// calls on a shared listener will interleave.
///
/// # Example
///
/// ```rust,no_run
/// use pyrunner::{Invocation, PythonRunner, RunnerConfiguration};
///
/// let config = RunnerConfiguration::new("/usr/bin/python3")?;
/// let runner = PythonRunner::new(config);
/// let text = runner.execute(&Invocation::new("hello.py").arg("world"))?;
/// println!("{text}");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct PythonRunner {
    config: RunnerConfiguration,
    backend: Arc<dyn ProcessRunner>,
    listeners: Listeners,
}

impl fmt::Debug for PythonRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PythonRunner")
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl PythonRunner {
    /// Runner using native process execution.
    #[must_use]
    pub fn new(config: RunnerConfiguration) -> Self {
        Self::with_backend(config, Arc::new(NativeRunner::new()))
    }

    /// Runner using a custom [`ProcessRunner`] backend.
    #[must_use]
    pub fn with_backend(config: RunnerConfiguration, backend: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            backend,
            listeners: Listeners::new(),
        }
    }

    /// Runner for the system interpreter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoDefaultInterpreter`] if no interpreter can be found.
    pub fn system_default() -> Result<Self, ConfigError> {
        RunnerConfiguration::system_default().map(Self::new)
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfiguration {
        &self.config
    }

    /// Mutable access to the per-invocation knobs; changes apply to later calls.
    pub fn config_mut(&mut self) -> &mut RunnerConfiguration {
        &mut self.config
    }

    /// Register a lifecycle listener for all later invocations.
    pub fn subscribe(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    /// Register a channel listener and return the receiving end.
    pub fn subscribe_channel(&mut self) -> Receiver<LifecycleEvent> {
        let (listener, rx) = ChannelListener::channel();
        self.listeners.push(Arc::new(listener));
        rx
    }

    /// Launch parameters for `invocation` under the current configuration.
    #[must_use]
    pub fn build_command(&self, invocation: &Invocation) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.config.interpreter()).args(self.config.launch_args());

        if let Some(script) = invocation.script() {
            cmd = cmd.arg(script);
        }
        cmd = cmd.args(invocation.arguments());

        if let Some(dir) = self.config.working_directory() {
            cmd = cmd.cwd(dir);
        }
        cmd
    }

    /// Run `invocation` and return the unclassified result.
    ///
    /// Checks that the script (if any) exists, relative to the working
    /// directory, before anything is spawned.
    ///
    /// # Errors
    ///
    /// [`RunnerError::ScriptNotFound`] or a host failure from the backend.
    pub fn run_with(&self, invocation: &Invocation) -> Result<ExecutionResult, RunnerError> {
        if let Some(script) = invocation.script() {
            let resolved = self.config.resolve_path(script);
            if !resolved.is_file() {
                tracing::debug!(script = %resolved.display(), "script not found");
                return Err(RunnerError::ScriptNotFound { path: resolved });
            }
        }

        let cmd = self.build_command(invocation);
        self.backend
            .run(&cmd, self.config.timeout(), &self.listeners)
    }

    /// Execute a script and return its trimmed standard output.
    ///
    /// A timed-out run returns its partial output ending in
    /// [`pyrunner_runner::TIMEOUT_SENTINEL`].
    ///
    /// # Errors
    ///
    /// * [`RunnerError::ScriptNotSpecified`] / [`RunnerError::ScriptNotFound`] before spawning
    /// * [`RunnerError::ScriptFailed`] when the script wrote to standard error
    /// * host failures while starting or waiting on the process
    pub fn execute(&self, invocation: &Invocation) -> Result<String, RunnerError> {
        if invocation.script().is_none() {
            return Err(RunnerError::ScriptNotSpecified);
        }
        self.run_with(invocation)?.into_text()
    }

    /// Run the bare interpreter with only launcher and interpreter arguments.
    ///
    /// # Errors
    ///
    /// Same classification as [`PythonRunner::execute`], minus the script checks.
    pub fn run(&self) -> Result<String, RunnerError> {
        self.run_with(&Invocation::bare())?.into_text()
    }

    /// Execute a script that prints a base64 payload and return the decoded bytes.
    ///
    /// # Errors
    ///
    /// Any [`PythonRunner::execute`] error, or [`PyRunnerError::Payload`].
    pub fn execute_payload(&self, invocation: &Invocation) -> Result<Vec<u8>, PyRunnerError> {
        let text = self.execute(invocation)?;
        decode_payload(&text)
    }

    /// [`PythonRunner::execute`] on a blocking worker.
    ///
    /// `cancel` is honoured only until the process is spawned; a running
    /// child is stopped by its timeout alone.
    ///
    /// # Errors
    ///
    /// [`RunnerError::Cancelled`] if `cancel` fired first, otherwise as `execute`.
    pub async fn execute_async(
        &self,
        invocation: Invocation,
        cancel: CancellationToken,
    ) -> Result<String, RunnerError> {
        let runner = self.clone();
        dispatch_blocking(cancel, move || runner.execute(&invocation)).await
    }

    /// [`PythonRunner::execute_payload`] on a blocking worker, with the same
    /// cancellation contract as [`PythonRunner::execute_async`].
    ///
    /// # Errors
    ///
    /// Cancellation (wrapped) if `cancel` fired first, otherwise as
    /// `execute_payload`.
    pub async fn execute_payload_async(
        &self,
        invocation: Invocation,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, PyRunnerError> {
        let runner = self.clone();
        dispatch_blocking(cancel, move || runner.execute_payload(&invocation)).await
    }

    /// [`PythonRunner::run`] on a blocking worker, with the same cancellation
    /// contract as [`PythonRunner::execute_async`].
    ///
    /// # Errors
    ///
    /// [`RunnerError::Cancelled`] if `cancel` fired first, otherwise as `run`.
    pub async fn run_async(&self, cancel: CancellationToken) -> Result<String, RunnerError> {
        let runner = self.clone();
        dispatch_blocking(cancel, move || runner.run()).await
    }
}

/// Run `work` on the blocking pool unless `cancel` fires before it starts.
pub(crate) async fn dispatch_blocking<T, E, F>(
    cancel: CancellationToken,
    work: F,
) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<RunnerError> + Send + 'static,
{
    if cancel.is_cancelled() {
        tracing::debug!("cancelled before dispatch");
        return Err(RunnerError::Cancelled.into());
    }

    let handle = tokio::task::spawn_blocking(move || {
        if cancel.is_cancelled() {
            tracing::debug!("cancelled before spawn");
            return Err(RunnerError::Cancelled.into());
        }
        work()
    });

    match handle.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "blocking task failed");
            Err(RunnerError::TaskFailed {
                reason: e.to_string(),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every command and returns a canned result.
    struct RecordingRunner {
        seen: Mutex<Vec<CommandSpec>>,
        result: ExecutionResult,
    }

    impl RecordingRunner {
        fn returning(result: ExecutionResult) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                result,
            })
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn run(
            &self,
            cmd: &CommandSpec,
            _timeout: Duration,
            listener: &dyn LifecycleListener,
        ) -> Result<ExecutionResult, RunnerError> {
            self.seen.lock().unwrap().push(cmd.clone());
            listener.on_started(self.result.started_at);
            listener.on_exited(self.result.exit_code, self.result.exited_at);
            Ok(self.result.clone())
        }
    }

    fn fixture(interpreter_name: &str) -> (tempfile::TempDir, RunnerConfiguration) {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = dir.path().join(interpreter_name);
        std::fs::write(&interpreter, "").unwrap();
        std::fs::write(dir.path().join("script.py"), "print('hi')").unwrap();
        let config = RunnerConfiguration::new(interpreter).unwrap();
        (dir, config)
    }

    fn os(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_build_command_orders_arguments() {
        let (dir, mut config) = fixture("py.exe");
        config.set_launcher_args(["-3.12"]);
        config.set_interpreter_args(["-u"]);
        config.set_working_directory(Some(dir.path().to_path_buf()));
        let runner = PythonRunner::new(config);

        let cmd = runner.build_command(&Invocation::new("script.py").arg("a b").arg(7));
        assert_eq!(cmd.args, os(&["-3.12", "-u", "script.py", "a b", "7"]));
        assert_eq!(cmd.cwd.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_build_command_skips_launcher_args_for_plain_interpreter() {
        let (_dir, mut config) = fixture("python3");
        config.set_launcher_args(["-3.12"]);
        let runner = PythonRunner::new(config);

        let cmd = runner.build_command(&Invocation::bare());
        assert!(cmd.args.is_empty());
        assert!(cmd.cwd.is_none());
    }

    #[test]
    fn test_execute_requires_script() {
        let (_dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend.clone());

        assert!(matches!(
            runner.execute(&Invocation::bare()),
            Err(RunnerError::ScriptNotSpecified)
        ));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_script_fails_before_spawn() {
        let (dir, mut config) = fixture("python3");
        config.set_working_directory(Some(dir.path().to_path_buf()));
        let backend = RecordingRunner::returning(ExecutionResult::new("", "", 0, false));
        let mut runner = PythonRunner::with_backend(config, backend.clone());
        let events = runner.subscribe_channel();

        match runner.execute(&Invocation::new("absent.py")) {
            Err(RunnerError::ScriptNotFound { path }) => {
                assert_eq!(path, dir.path().join("absent.py"));
            }
            other => panic!("expected ScriptNotFound, got {other:?}"),
        }
        assert!(backend.seen.lock().unwrap().is_empty());
        assert_eq!(events.try_iter().count(), 0);
    }

    #[test]
    fn test_relative_script_resolved_against_working_directory() {
        let (dir, mut config) = fixture("python3");
        config.set_working_directory(Some(dir.path().to_path_buf()));
        let backend = RecordingRunner::returning(ExecutionResult::new("hi\n", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend.clone());

        assert_eq!(runner.execute(&Invocation::new("script.py")).unwrap(), "hi");
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].args, os(&["script.py"]));
    }

    #[test]
    fn test_execute_classifies_stderr_as_script_failure() {
        let (dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new(
            "",
            "Traceback (most recent call last):\nValueError",
            1,
            false,
        ));
        let runner = PythonRunner::with_backend(config, backend);

        let script = dir.path().join("script.py");
        match runner.execute(&Invocation::new(&script)) {
            Err(RunnerError::ScriptFailed { stderr }) => {
                assert_eq!(stderr, "Traceback (most recent call last):\nValueError");
            }
            other => panic!("expected ScriptFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_run_uses_bare_interpreter() {
        let (_dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("Python 3.12.1", "", 0, false));
        let mut runner = PythonRunner::with_backend(config, backend.clone());
        runner.config_mut().set_interpreter_args(["--version"]);

        assert_eq!(runner.run().unwrap(), "Python 3.12.1");
        assert_eq!(backend.seen.lock().unwrap()[0].args, os(&["--version"]));
    }

    #[test]
    fn test_execute_payload_decodes_bytes_literal() {
        let (dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("b'aGVsbG8='", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend);

        let bytes = runner
            .execute_payload(&Invocation::new(dir.path().join("script.py")))
            .unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_subscribers_receive_events() {
        let (dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("ok", "", 0, false));
        let mut runner = PythonRunner::with_backend(config, backend);
        let events = runner.subscribe_channel();

        runner
            .execute(&Invocation::new(dir.path().join("script.py")))
            .unwrap();
        let events: Vec<_> = events.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LifecycleEvent::Started { .. }));
    }

    #[tokio::test]
    async fn test_execute_async_cancelled_never_spawns() {
        let (dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("ok", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = runner
            .execute_async(Invocation::new(dir.path().join("script.py")), cancel)
            .await;

        assert!(matches!(result, Err(RunnerError::Cancelled)));
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_async_completes_when_not_cancelled() {
        let (_dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("3.12", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend);

        let text = runner.run_async(CancellationToken::new()).await.unwrap();
        assert_eq!(text, "3.12");
    }

    #[tokio::test]
    async fn test_execute_payload_async_decodes_and_honours_cancellation() {
        let (dir, config) = fixture("python3");
        let backend = RecordingRunner::returning(ExecutionResult::new("b'aGVsbG8='", "", 0, false));
        let runner = PythonRunner::with_backend(config, backend.clone());
        let script = dir.path().join("script.py");

        let bytes = runner
            .execute_payload_async(Invocation::new(&script), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"hello");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = runner
            .execute_payload_async(Invocation::new(&script), cancel)
            .await;
        assert!(matches!(
            result,
            Err(PyRunnerError::Runner(RunnerError::Cancelled))
        ));
        assert_eq!(backend.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_debug_does_not_require_backend_debug() {
        let (_dir, config) = fixture("python3");
        let runner = PythonRunner::new(config);
        let rendered = format!("{runner:?}");
        assert!(rendered.contains("PythonRunner"));
        assert!(rendered.contains("python3"));
    }
}
