use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::builder::RunnerConfigurationBuilder;
use crate::error::ConfigError;
use crate::validation::{
    DEFAULT_SCRIPT_TIMEOUT_MS, existing_interpreter, is_launcher, timeout_from_millis,
};

/// Fixed location of the system interpreter.
#[cfg(windows)]
pub const SYSTEM_INTERPRETER: &str = r"c:\windows\py.exe";

/// Fixed location of the system interpreter.
#[cfg(not(windows))]
pub const SYSTEM_INTERPRETER: &str = "/usr/bin/python3";

/// Launch identity plus per-invocation knobs for one interpreter.
///
/// The interpreter path is validated at construction and never changes; to
/// target a different interpreter derive a new value with
/// [`RunnerConfiguration::bound_to`]. Argument lists, working directory and
/// timeout may be changed between invocations.
///
/// # Example
///
/// ```rust,no_run
/// use pyrunner_config::RunnerConfiguration;
///
/// let mut config = RunnerConfiguration::new("/usr/bin/python3")?;
/// config.set_interpreter_args(["-u"]);
/// config.set_timeout_ms(5_000)?;
/// # Ok::<(), pyrunner_config::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfiguration {
    interpreter: PathBuf,
    launcher_args: Vec<String>,
    interpreter_args: Vec<String>,
    working_directory: Option<PathBuf>,
    timeout: Duration,
}

impl RunnerConfiguration {
    /// Create a configuration for an existing interpreter with default knobs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InterpreterNotFound`] if `interpreter` is not a file.
    pub fn new(interpreter: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let interpreter = existing_interpreter(&interpreter.into())?;
        Ok(Self {
            interpreter,
            launcher_args: Vec::new(),
            interpreter_args: Vec::new(),
            working_directory: None,
            timeout: Duration::from_millis(DEFAULT_SCRIPT_TIMEOUT_MS),
        })
    }

    /// Start a builder for `interpreter`.
    #[must_use]
    pub fn builder(interpreter: impl Into<PathBuf>) -> RunnerConfigurationBuilder {
        RunnerConfigurationBuilder::new(interpreter)
    }

    /// Configuration for the system interpreter.
    ///
    /// Uses [`SYSTEM_INTERPRETER`] when present, otherwise the first `python3`
    /// or `python` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDefaultInterpreter`] if neither is found.
    pub fn system_default() -> Result<Self, ConfigError> {
        let interpreter = locate_system_interpreter().ok_or(ConfigError::NoDefaultInterpreter)?;
        tracing::debug!(interpreter = %interpreter.display(), "using system interpreter");
        Self::new(interpreter)
    }

    /// Derive a configuration for another interpreter (e.g. a prepared
    /// virtual environment), copying argument lists, working directory and
    /// timeout. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InterpreterNotFound`] if `interpreter` is not a file.
    pub fn bound_to(&self, interpreter: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let interpreter = existing_interpreter(&interpreter.into())?;
        Ok(Self {
            interpreter,
            launcher_args: self.launcher_args.clone(),
            interpreter_args: self.interpreter_args.clone(),
            working_directory: self.working_directory.clone(),
            timeout: self.timeout,
        })
    }

    #[must_use]
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    #[must_use]
    pub fn launcher_args(&self) -> &[String] {
        &self.launcher_args
    }

    #[must_use]
    pub fn interpreter_args(&self) -> &[String] {
        &self.interpreter_args
    }

    #[must_use]
    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_launcher_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.launcher_args = args.into_iter().map(Into::into).collect();
    }

    pub fn set_interpreter_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter_args = args.into_iter().map(Into::into).collect();
    }

    /// Set the working directory. `None` or an empty path means the caller's
    /// current directory.
    pub fn set_working_directory(&mut self, dir: Option<PathBuf>) {
        self.working_directory = dir.filter(|d| !d.as_os_str().is_empty());
    }

    /// Set the timeout in milliseconds; 0 selects the default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for negative values, leaving the
    /// current timeout unchanged.
    pub fn set_timeout_ms(&mut self, millis: i64) -> Result<(), ConfigError> {
        self.timeout = timeout_from_millis("timeout_ms", millis, DEFAULT_SCRIPT_TIMEOUT_MS)?;
        Ok(())
    }

    /// Whether the interpreter is the OS launcher, in which case launcher
    /// arguments are emitted.
    #[must_use]
    pub fn uses_launcher(&self) -> bool {
        is_launcher(&self.interpreter)
    }

    /// Leading arguments for every invocation: launcher arguments (only for
    /// the launcher) followed by interpreter arguments.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let launcher: &[String] = if self.uses_launcher() {
            self.launcher_args.as_slice()
        } else {
            &[]
        };
        launcher
            .iter()
            .chain(self.interpreter_args.iter())
            .cloned()
            .collect()
    }

    /// Resolve `path` against the working directory when it is relative.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.working_directory {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub(crate) fn from_parts(
        interpreter: PathBuf,
        launcher_args: Vec<String>,
        interpreter_args: Vec<String>,
        working_directory: Option<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            interpreter,
            launcher_args,
            interpreter_args,
            working_directory,
            timeout,
        }
    }
}

fn locate_system_interpreter() -> Option<PathBuf> {
    let fixed = Path::new(SYSTEM_INTERPRETER);
    if fixed.is_file() {
        return Some(fixed.to_path_buf());
    }

    ["python3", "python"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}
