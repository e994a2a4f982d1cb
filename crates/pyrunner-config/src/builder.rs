use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::RunnerConfiguration;
use crate::validation::{DEFAULT_SCRIPT_TIMEOUT_MS, existing_interpreter, timeout_from_millis};

/// Builder for [`RunnerConfiguration`].
///
/// Nothing is validated until [`build`](Self::build), so a builder can be
/// assembled from several sources before the interpreter is checked.
///
/// # Example
///
/// ```rust,no_run
/// use pyrunner_config::RunnerConfiguration;
///
/// let config = RunnerConfiguration::builder(r"c:\windows\py.exe")
///     .launcher_args(["-3.12"])
///     .interpreter_args(["-u"])
///     .working_directory("scripts")
///     .timeout_ms(10_000)
///     .build()?;
/// # Ok::<(), pyrunner_config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RunnerConfigurationBuilder {
    interpreter: PathBuf,
    launcher_args: Vec<String>,
    interpreter_args: Vec<String>,
    working_directory: Option<PathBuf>,
    timeout_ms: Option<i64>,
}

impl RunnerConfigurationBuilder {
    #[must_use]
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            launcher_args: Vec::new(),
            interpreter_args: Vec::new(),
            working_directory: None,
            timeout_ms: None,
        }
    }

    /// Arguments for the OS launcher; ignored unless the interpreter is `py.exe`.
    #[must_use]
    pub fn launcher_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.launcher_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn interpreter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Timeout in milliseconds; 0 selects the default, negative fails `build`.
    #[must_use]
    pub fn timeout_ms(mut self, millis: i64) -> Self {
        self.timeout_ms = Some(millis);
        self
    }

    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InterpreterNotFound`] if the interpreter is not a file
    /// * [`ConfigError::InvalidValue`] for a negative timeout
    pub fn build(self) -> Result<RunnerConfiguration, ConfigError> {
        let interpreter = existing_interpreter(&self.interpreter)?;
        let timeout = timeout_from_millis(
            "timeout_ms",
            self.timeout_ms.unwrap_or(0),
            DEFAULT_SCRIPT_TIMEOUT_MS,
        )?;

        let working_directory = self
            .working_directory
            .filter(|dir| !dir.as_os_str().is_empty());

        Ok(RunnerConfiguration::from_parts(
            interpreter,
            self.launcher_args,
            self.interpreter_args,
            working_directory,
            timeout,
        ))
    }
}
