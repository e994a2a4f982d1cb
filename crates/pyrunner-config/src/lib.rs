//! Configuration for pyrunner
//!
//! [`RunnerConfiguration`] is the validated launch identity handed to the
//! runner. [`Settings`] merges command-line overrides, `PYRUNNER_*`
//! environment variables and `pyrunner.toml` (in that order of precedence)
//! and records where each value came from.

mod builder;
mod error;
mod model;
mod sources;
mod validation;

pub use builder::RunnerConfigurationBuilder;
pub use error::ConfigError;
pub use model::{RunnerConfiguration, SYSTEM_INTERPRETER};
pub use sources::{
    CONFIG_FILE_NAME, ConfigOverrides, ConfigSource, ENV_INTERPRETER, ENV_TIMEOUT_MS,
    ENV_WORKING_DIR, EnvironmentSection, EnvironmentSettings, PyRunnerConfig, RunnerSection,
    Settings,
};
pub use validation::{DEFAULT_SCRIPT_TIMEOUT_MS, DEFAULT_SETUP_TIMEOUT_MS, is_launcher};
