//! pyrunner - run Python scripts as child processes
//!
//! pyrunner launches a Python interpreter with a script and arguments,
//! captures standard output and standard error, enforces a hard timeout and
//! reports `Started`/`Exited` lifecycle events. Any text the script writes to
//! standard error is treated as a failure.
//!
//! pyrunner can be used in two ways:
//! - **CLI**: `pyrunner exec script.py arg1 arg2`
//! - **Library**: build a [`RunnerConfiguration`] and call [`PythonRunner::execute`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use pyrunner::{Invocation, PythonRunner, RunnerError};
//!
//! let mut runner = PythonRunner::system_default()?;
//! runner.config_mut().set_timeout_ms(5_000)?;
//! let events = runner.subscribe_channel();
//!
//! match runner.execute(&Invocation::new("hello.py").arg("world")) {
//!     Ok(text) => println!("{text}"),
//!     Err(RunnerError::ScriptFailed { stderr }) => eprintln!("script failed:\n{stderr}"),
//!     Err(other) => return Err(other.into()),
//! }
//!
//! for event in events.try_iter() {
//!     println!("{event:?}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Virtual environments
//!
//! [`EnvironmentBootstrap`] creates a virtual environment with the base
//! interpreter, installs requirements and returns a configuration bound to
//! the environment interpreter.
//!
//! # Crate layout
//!
//! - [`pyrunner_runner`]: the run primitive (spawn, drain, timeout, kill)
//! - [`pyrunner_config`]: validated configuration and file/env discovery
//! - [`pyrunner_utils`]: exit codes, error reporting and logging setup

pub mod cli;
pub mod error;
pub mod invocation;
pub mod payload;
pub mod python;
pub mod venv;

pub use error::PyRunnerError;
pub use invocation::Invocation;
pub use payload::decode_payload;
pub use python::PythonRunner;
pub use venv::{DEFAULT_ENVIRONMENT_DIR, EnvironmentBootstrap};

pub use pyrunner_config::{
    ConfigError, ConfigOverrides, ConfigSource, RunnerConfiguration, RunnerConfigurationBuilder,
    Settings,
};
pub use pyrunner_runner::{
    ChannelListener, CommandSpec, ExecutionResult, InvocationState, LifecycleEvent,
    LifecycleListener, NativeRunner, ProcessRunner, RunnerError, TIMEOUT_SENTINEL,
};
pub use pyrunner_utils::{ErrorCategory, ExitCode, UserFriendlyError};
