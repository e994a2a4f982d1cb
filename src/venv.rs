//! Virtual environment bootstrap
//!
//! Creates an isolated environment with `python -m venv`, upgrades pip and
//! installs a requirements file, all through the same [`ProcessRunner`] used
//! for scripts. Package tools print notices on standard error, so steps are
//! judged by exit code and timeout instead.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pyrunner_config::{DEFAULT_SETUP_TIMEOUT_MS, RunnerConfiguration, Settings};
use pyrunner_runner::{
    CommandSpec, ExecutionResult, LifecycleListener, Listeners, NativeRunner, ProcessRunner,
};
use pyrunner_utils::logging::bootstrap_span;
use tokio_util::sync::CancellationToken;

use crate::error::PyRunnerError;
use crate::python::dispatch_blocking;

/// Directory name used when no environment path is configured.
pub const DEFAULT_ENVIRONMENT_DIR: &str = ".venv";

/// Marker file written by `venv` at the environment root.
const PYVENV_CFG: &str = "pyvenv.cfg";

/// Creates and maintains one virtual environment.
#[derive(Clone)]
pub struct EnvironmentBootstrap {
    base: RunnerConfiguration,
    directory: PathBuf,
    setup_timeout: Duration,
    upgrade_pip: bool,
    backend: Arc<dyn ProcessRunner>,
    listeners: Listeners,
}

impl std::fmt::Debug for EnvironmentBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentBootstrap")
            .field("base", &self.base)
            .field("directory", &self.directory)
            .field("setup_timeout", &self.setup_timeout)
            .field("upgrade_pip", &self.upgrade_pip)
            .finish_non_exhaustive()
    }
}

impl EnvironmentBootstrap {
    /// Bootstrap an environment at `<working directory>/.venv` using the
    /// base (global) interpreter.
    ///
    /// # Errors
    ///
    /// [`PyRunnerError::Io`] if no working directory is configured and the
    /// current directory cannot be determined.
    pub fn new(base: RunnerConfiguration) -> Result<Self, PyRunnerError> {
        let root = match base.working_directory() {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(|source| PyRunnerError::Io {
                path: PathBuf::from("."),
                source,
            })?,
        };

        Ok(Self {
            directory: root.join(DEFAULT_ENVIRONMENT_DIR),
            base,
            setup_timeout: Duration::from_millis(DEFAULT_SETUP_TIMEOUT_MS),
            upgrade_pip: true,
            backend: Arc::new(NativeRunner::new()),
            listeners: Listeners::new(),
        })
    }

    /// Bootstrap configured from merged [`Settings`].
    ///
    /// # Errors
    ///
    /// Configuration errors from the interpreter or timeouts.
    pub fn from_settings(settings: &Settings) -> Result<Self, PyRunnerError> {
        let mut bootstrap = Self::new(settings.runner_configuration()?)?
            .with_setup_timeout(settings.setup_timeout()?)
            .with_upgrade_pip(settings.environment.upgrade_pip);
        if let Some(path) = &settings.environment.path {
            bootstrap = bootstrap.with_directory(path);
        }
        Ok(bootstrap)
    }

    /// Place the environment at `directory`. A relative path is taken from
    /// the working directory, where the setup steps run.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = self.base.resolve_path(&directory.into());
        self
    }

    #[must_use]
    pub fn with_setup_timeout(mut self, timeout: Duration) -> Self {
        self.setup_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_upgrade_pip(mut self, upgrade_pip: bool) -> Self {
        self.upgrade_pip = upgrade_pip;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn ProcessRunner>) -> Self {
        self.backend = backend;
        self
    }

    pub fn subscribe(&mut self, listener: Arc<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn environment_directory(&self) -> &Path {
        &self.directory
    }

    /// Interpreter inside the environment.
    #[must_use]
    pub fn environment_interpreter(&self) -> PathBuf {
        if cfg!(windows) {
            self.directory.join("Scripts").join("python.exe")
        } else {
            self.directory.join("bin").join("python3")
        }
    }

    /// Whether the environment has been created.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.directory.join(PYVENV_CFG).is_file()
    }

    /// Create the environment if needed, upgrade pip, install `requirements`,
    /// and return a configuration bound to the environment interpreter.
    ///
    /// # Errors
    ///
    /// [`PyRunnerError::Bootstrap`] if a step exits non-zero or times out,
    /// [`PyRunnerError::Io`] for a missing requirements file, configuration
    /// errors if the environment interpreter is missing afterwards.
    pub fn create(&self, requirements: Option<&Path>) -> Result<RunnerConfiguration, PyRunnerError> {
        if let Some(requirements) = requirements {
            self.check_requirements(requirements)?;
        }

        if self.exists() {
            tracing::debug!(environment = %self.directory.display(), "environment already present");
        } else {
            let cmd = self
                .base_command()
                .args(["-m", "venv"])
                .arg(&self.directory);
            self.step("create", cmd)?;
        }

        if self.upgrade_pip {
            let cmd = self
                .pip_command()
                .args(["install", "--upgrade", "pip"]);
            self.step("upgrade pip", cmd)?;
        }

        if let Some(requirements) = requirements {
            self.install(requirements)?;
        }

        tracing::info!(environment = %self.directory.display(), "environment ready");
        Ok(self.base.bound_to(self.environment_interpreter())?)
    }

    /// Install a requirements file into the existing environment.
    ///
    /// # Errors
    ///
    /// As [`EnvironmentBootstrap::create`].
    pub fn install_requirements(&self, requirements: &Path) -> Result<(), PyRunnerError> {
        self.check_requirements(requirements)?;
        self.install(requirements)
    }

    /// Remove the environment directory. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// [`PyRunnerError::Io`] if the directory is not a virtual environment
    /// or cannot be removed.
    pub fn delete(&self) -> Result<bool, PyRunnerError> {
        if !self.directory.exists() {
            return Ok(false);
        }

        if !self.exists() {
            return Err(PyRunnerError::Io {
                path: self.directory.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "refusing to delete a directory without pyvenv.cfg",
                ),
            });
        }

        std::fs::remove_dir_all(&self.directory).map_err(|source| PyRunnerError::Io {
            path: self.directory.clone(),
            source,
        })?;
        tracing::info!(environment = %self.directory.display(), "environment deleted");
        Ok(true)
    }

    /// [`EnvironmentBootstrap::create`] on a blocking worker; `cancel` is
    /// honoured only before the first step starts.
    ///
    /// # Errors
    ///
    /// [`pyrunner_runner::RunnerError::Cancelled`] (wrapped) if cancelled first,
    /// otherwise as `create`.
    pub async fn create_async(
        &self,
        requirements: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<RunnerConfiguration, PyRunnerError> {
        let bootstrap = self.clone();
        dispatch_blocking(cancel, move || bootstrap.create(requirements.as_deref())).await
    }

    /// [`EnvironmentBootstrap::install_requirements`] on a blocking worker.
    ///
    /// # Errors
    ///
    /// As [`EnvironmentBootstrap::create_async`].
    pub async fn install_requirements_async(
        &self,
        requirements: PathBuf,
        cancel: CancellationToken,
    ) -> Result<(), PyRunnerError> {
        let bootstrap = self.clone();
        dispatch_blocking(cancel, move || bootstrap.install_requirements(&requirements)).await
    }

    fn install(&self, requirements: &Path) -> Result<(), PyRunnerError> {
        let cmd = self
            .pip_command()
            .args(["install", "-r"])
            .arg(requirements);
        self.step("install requirements", cmd)?;
        Ok(())
    }

    fn check_requirements(&self, requirements: &Path) -> Result<(), PyRunnerError> {
        let resolved = self.base.resolve_path(requirements);
        if resolved.is_file() {
            Ok(())
        } else {
            Err(PyRunnerError::Io {
                path: resolved,
                source: io::Error::new(io::ErrorKind::NotFound, "requirements file not found"),
            })
        }
    }

    fn base_command(&self) -> CommandSpec {
        let cmd = CommandSpec::new(self.base.interpreter()).args(self.base.launch_args());
        self.in_working_directory(cmd)
    }

    fn pip_command(&self) -> CommandSpec {
        let cmd = CommandSpec::new(self.environment_interpreter())
            .args(["-m", "pip"])
            .env("PIP_DISABLE_PIP_VERSION_CHECK", "1");
        self.in_working_directory(cmd)
    }

    fn in_working_directory(&self, cmd: CommandSpec) -> CommandSpec {
        match self.base.working_directory() {
            Some(dir) => cmd.cwd(dir),
            None => cmd,
        }
    }

    fn step(&self, name: &str, cmd: CommandSpec) -> Result<ExecutionResult, PyRunnerError> {
        let environment = self.directory.display().to_string();
        let span = bootstrap_span(name, &environment);
        let _enter = span.enter();

        tracing::info!("running environment step");
        let result = self.backend.run(&cmd, self.setup_timeout, &self.listeners)?;

        if result.timed_out || result.exit_code != 0 {
            tracing::warn!(
                exit_code = result.exit_code,
                timed_out = result.timed_out,
                "environment step failed"
            );
            return Err(PyRunnerError::Bootstrap {
                step: name.to_string(),
                exit_code: result.exit_code,
                timed_out: result.timed_out,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}
