use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::RunnerConfiguration;
use crate::validation::{DEFAULT_SETUP_TIMEOUT_MS, parse_timeout_ms, timeout_from_millis};

/// File name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = "pyrunner.toml";

pub const ENV_INTERPRETER: &str = "PYRUNNER_INTERPRETER";
pub const ENV_TIMEOUT_MS: &str = "PYRUNNER_TIMEOUT_MS";
pub const ENV_WORKING_DIR: &str = "PYRUNNER_WORKING_DIR";

/// Where an effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Command-line flag (highest precedence).
    Cli,
    /// `PYRUNNER_*` environment variable.
    Env,
    /// `pyrunner.toml`.
    Config,
    /// Built-in default (lowest precedence).
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// File model
// ============================================================================

/// `pyrunner.toml` file structure.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PyRunnerConfig {
    #[serde(default)]
    pub runner: RunnerSection,
    #[serde(default)]
    pub environment: EnvironmentSection,
}

/// `[runner]` section.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    pub interpreter: Option<PathBuf>,
    pub launcher_args: Option<Vec<String>>,
    pub interpreter_args: Option<Vec<String>>,
    pub working_directory: Option<PathBuf>,
    pub timeout_ms: Option<i64>,
}

/// `[environment]` section.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    pub path: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub setup_timeout_ms: Option<i64>,
    pub upgrade_pip: Option<bool>,
}

impl PyRunnerConfig {
    /// Load and parse a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] if the file is missing, [`ConfigError::Io`]
    /// if it cannot be read, [`ConfigError::InvalidFile`] if it is not valid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string().trim().to_string(),
        })
    }
}

// ============================================================================
// Overrides and resolved settings
// ============================================================================

/// Values supplied on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub interpreter: Option<PathBuf>,
    pub launcher_args: Vec<String>,
    pub interpreter_args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub timeout_ms: Option<i64>,
    pub environment_path: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
}

/// Environment bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    pub path: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub setup_timeout_ms: i64,
    pub upgrade_pip: bool,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            path: None,
            requirements: None,
            setup_timeout_ms: 0,
            upgrade_pip: true,
        }
    }
}

/// Settings after merging CLI > env > file > defaults.
///
/// The interpreter is kept as a path here; it is only checked for existence
/// when [`Settings::runner_configuration`] builds the validated value.
#[derive(Debug, Clone)]
pub struct Settings {
    pub interpreter: Option<PathBuf>,
    pub launcher_args: Vec<String>,
    pub interpreter_args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub timeout_ms: i64,
    pub environment: EnvironmentSettings,
    /// The configuration file that was loaded, if any.
    pub config_file: Option<PathBuf>,
    source_attribution: HashMap<String, ConfigSource>,
}

impl Settings {
    /// Discover settings from the current directory and process environment.
    ///
    /// # Errors
    ///
    /// Propagates file, environment and validation failures.
    pub fn discover(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover_from(&start_dir, overrides, |key| std::env::var(key).ok())
    }

    /// Discover settings starting at `start_dir`, reading environment
    /// variables through `env`.
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    ///
    /// # Errors
    ///
    /// Propagates file, environment and validation failures.
    pub fn discover_from<F>(
        start_dir: &Path,
        overrides: &ConfigOverrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self {
            interpreter: None,
            launcher_args: Vec::new(),
            interpreter_args: Vec::new(),
            working_directory: None,
            timeout_ms: 0,
            environment: EnvironmentSettings::default(),
            config_file: None,
            source_attribution: HashMap::new(),
        };

        let config_path = match &overrides.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = config_path {
            tracing::debug!(path = %path.display(), "loading configuration file");
            let file = PyRunnerConfig::load(&path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            settings.apply_file(file, &base);
            settings.config_file = Some(path);
        }

        settings.apply_env(&env)?;
        settings.apply_overrides(overrides);
        settings.validate()?;

        Ok(settings)
    }

    /// Search upward from `start_dir` for `pyrunner.toml`, stopping at a
    /// repository root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() {
                break;
            }

            current = dir.parent();
        }

        None
    }

    fn apply_file(&mut self, file: PyRunnerConfig, base: &Path) {
        let runner = file.runner;
        if let Some(interpreter) = runner.interpreter {
            self.interpreter = Some(interpreter);
            self.attribute("interpreter", ConfigSource::Config);
        }
        if let Some(args) = runner.launcher_args {
            self.launcher_args = args;
            self.attribute("launcher_args", ConfigSource::Config);
        }
        if let Some(args) = runner.interpreter_args {
            self.interpreter_args = args;
            self.attribute("interpreter_args", ConfigSource::Config);
        }
        if let Some(dir) = runner.working_directory {
            self.working_directory = Some(base.join(dir));
            self.attribute("working_directory", ConfigSource::Config);
        }
        if let Some(timeout_ms) = runner.timeout_ms {
            self.timeout_ms = timeout_ms;
            self.attribute("timeout_ms", ConfigSource::Config);
        }

        let environment = file.environment;
        if let Some(path) = environment.path {
            self.environment.path = Some(base.join(path));
            self.attribute("environment.path", ConfigSource::Config);
        }
        if let Some(requirements) = environment.requirements {
            self.environment.requirements = Some(base.join(requirements));
            self.attribute("environment.requirements", ConfigSource::Config);
        }
        if let Some(timeout_ms) = environment.setup_timeout_ms {
            self.environment.setup_timeout_ms = timeout_ms;
            self.attribute("environment.setup_timeout_ms", ConfigSource::Config);
        }
        if let Some(upgrade_pip) = environment.upgrade_pip {
            self.environment.upgrade_pip = upgrade_pip;
            self.attribute("environment.upgrade_pip", ConfigSource::Config);
        }
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(interpreter) = env(ENV_INTERPRETER).filter(|v| !v.is_empty()) {
            self.interpreter = Some(PathBuf::from(interpreter));
            self.attribute("interpreter", ConfigSource::Env);
        }
        if let Some(raw) = env(ENV_TIMEOUT_MS).filter(|v| !v.is_empty()) {
            self.timeout_ms = parse_timeout_ms(ENV_TIMEOUT_MS, &raw)?;
            self.attribute("timeout_ms", ConfigSource::Env);
        }
        if let Some(dir) = env(ENV_WORKING_DIR).filter(|v| !v.is_empty()) {
            self.working_directory = Some(PathBuf::from(dir));
            self.attribute("working_directory", ConfigSource::Env);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(interpreter) = &overrides.interpreter {
            self.interpreter = Some(interpreter.clone());
            self.attribute("interpreter", ConfigSource::Cli);
        }
        if !overrides.launcher_args.is_empty() {
            self.launcher_args = overrides.launcher_args.clone();
            self.attribute("launcher_args", ConfigSource::Cli);
        }
        if !overrides.interpreter_args.is_empty() {
            self.interpreter_args = overrides.interpreter_args.clone();
            self.attribute("interpreter_args", ConfigSource::Cli);
        }
        if let Some(dir) = &overrides.working_directory {
            self.working_directory = Some(dir.clone());
            self.attribute("working_directory", ConfigSource::Cli);
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
            self.attribute("timeout_ms", ConfigSource::Cli);
        }
        if let Some(path) = &overrides.environment_path {
            self.environment.path = Some(path.clone());
            self.attribute("environment.path", ConfigSource::Cli);
        }
        if let Some(requirements) = &overrides.requirements {
            self.environment.requirements = Some(requirements.clone());
            self.attribute("environment.requirements", ConfigSource::Cli);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".to_string(),
                value: format!("must not be negative (got {})", self.timeout_ms),
            });
        }
        if self.environment.setup_timeout_ms < 0 {
            return Err(ConfigError::InvalidValue {
                key: "setup_timeout_ms".to_string(),
                value: format!(
                    "must not be negative (got {})",
                    self.environment.setup_timeout_ms
                ),
            });
        }
        Ok(())
    }

    fn attribute(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }

    /// Source of the effective value for `key`.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as `key -> (value, source)` pairs.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: String| {
            let source = self.source_of(key).label().to_string();
            config.insert(key.to_string(), (value, source));
        };

        add(
            "interpreter",
            self.interpreter.as_ref().map_or_else(
                || "(system default)".to_string(),
                |p| p.display().to_string(),
            ),
        );
        add("launcher_args", self.launcher_args.join(" "));
        add("interpreter_args", self.interpreter_args.join(" "));
        add(
            "working_directory",
            self.working_directory.as_ref().map_or_else(
                || "(current directory)".to_string(),
                |p| p.display().to_string(),
            ),
        );
        add("timeout_ms", self.timeout_ms.to_string());
        add(
            "environment.path",
            self.environment.path.as_ref().map_or_else(
                || "(<working directory>/.venv)".to_string(),
                |p| p.display().to_string(),
            ),
        );
        add(
            "environment.requirements",
            self.environment
                .requirements
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        add(
            "environment.setup_timeout_ms",
            self.environment.setup_timeout_ms.to_string(),
        );
        add(
            "environment.upgrade_pip",
            self.environment.upgrade_pip.to_string(),
        );

        config
    }

    /// Build the validated [`RunnerConfiguration`], falling back to the
    /// system interpreter when none was configured.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InterpreterNotFound`], [`ConfigError::NoDefaultInterpreter`]
    /// or [`ConfigError::InvalidValue`].
    pub fn runner_configuration(&self) -> Result<RunnerConfiguration, ConfigError> {
        let mut config = match &self.interpreter {
            Some(interpreter) => RunnerConfiguration::new(interpreter)?,
            None => RunnerConfiguration::system_default()?,
        };
        config.set_launcher_args(self.launcher_args.iter().cloned());
        config.set_interpreter_args(self.interpreter_args.iter().cloned());
        config.set_working_directory(self.working_directory.clone());
        config.set_timeout_ms(self.timeout_ms)?;
        Ok(config)
    }

    /// Bound for environment setup steps.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a negative value.
    pub fn setup_timeout(&self) -> Result<Duration, ConfigError> {
        timeout_from_millis(
            "setup_timeout_ms",
            self.environment.setup_timeout_ms,
            DEFAULT_SETUP_TIMEOUT_MS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let settings =
            Settings::discover_from(dir.path(), &ConfigOverrides::default(), no_env).unwrap();
        assert!(settings.config_file.is_none());
        assert!(settings.interpreter.is_none());
        assert_eq!(settings.timeout_ms, 0);
        assert!(settings.environment.upgrade_pip);
        assert_eq!(settings.source_of("timeout_ms"), ConfigSource::Default);
        assert_eq!(settings.setup_timeout().unwrap(), Duration::from_millis(120_000));
    }

    #[test]
    fn test_file_is_discovered_upward() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[runner]\ntimeout_ms = 5000\ninterpreter_args = [\"-u\"]\n\n[environment]\npath = \"envs/main\"\nupgrade_pip = false\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let settings =
            Settings::discover_from(&nested, &ConfigOverrides::default(), no_env).unwrap();
        assert_eq!(settings.config_file, Some(dir.path().join(CONFIG_FILE_NAME)));
        assert_eq!(settings.timeout_ms, 5000);
        assert_eq!(settings.interpreter_args, vec!["-u".to_string()]);
        assert_eq!(settings.environment.path, Some(dir.path().join("envs/main")));
        assert!(!settings.environment.upgrade_pip);
        assert_eq!(settings.source_of("timeout_ms"), ConfigSource::Config);
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join(CONFIG_FILE_NAME), "").unwrap();
        let repo = outer.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(Settings::discover_config_file_from(&repo).is_none());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[runner]\ninterpreter = \"/from/file\"\ntimeout_ms = 1000\nworking_directory = \"work\"\n",
        )
        .unwrap();

        let env = |key: &str| match key {
            ENV_INTERPRETER => Some("/from/env".to_string()),
            ENV_TIMEOUT_MS => Some("2000".to_string()),
            _ => None,
        };
        let overrides = ConfigOverrides {
            timeout_ms: Some(3000),
            ..ConfigOverrides::default()
        };

        let settings = Settings::discover_from(dir.path(), &overrides, env).unwrap();
        assert_eq!(settings.interpreter, Some(PathBuf::from("/from/env")));
        assert_eq!(settings.timeout_ms, 3000);
        assert_eq!(settings.working_directory, Some(dir.path().join("work")));

        assert_eq!(settings.source_of("interpreter"), ConfigSource::Env);
        assert_eq!(settings.source_of("timeout_ms"), ConfigSource::Cli);
        assert_eq!(settings.source_of("working_directory"), ConfigSource::Config);

        let effective = settings.effective_config();
        assert_eq!(
            effective["timeout_ms"],
            ("3000".to_string(), "cli".to_string())
        );
        assert_eq!(
            effective["interpreter"],
            ("/from/env".to_string(), "env".to_string())
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[runner]\ntimeout = 5\n").unwrap();

        match PyRunnerConfig::load(&path) {
            Err(ConfigError::InvalidFile { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected InvalidFile, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(dir.path().join("missing.toml")),
            ..ConfigOverrides::default()
        };
        let err = Settings::discover_from(dir.path(), &overrides, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_negative_file_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[environment]\nsetup_timeout_ms = -1\n").unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(path),
            ..ConfigOverrides::default()
        };
        let err = Settings::discover_from(dir.path(), &overrides, no_env).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "setup_timeout_ms"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_env_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let env = |key: &str| (key == ENV_TIMEOUT_MS).then(|| "later".to_string());
        let err = Settings::discover_from(dir.path(), &ConfigOverrides::default(), env)
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, ENV_TIMEOUT_MS),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_runner_configuration_validates_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let interpreter = dir.path().join("python3");
        fs::write(&interpreter, "").unwrap();

        let overrides = ConfigOverrides {
            interpreter: Some(interpreter.clone()),
            interpreter_args: vec!["-u".to_string()],
            timeout_ms: Some(250),
            ..ConfigOverrides::default()
        };
        let settings = Settings::discover_from(dir.path(), &overrides, no_env).unwrap();
        let config = settings.runner_configuration().unwrap();
        assert_eq!(config.interpreter(), interpreter.as_path());
        assert_eq!(config.interpreter_args(), ["-u".to_string()]);
        assert_eq!(config.timeout(), Duration::from_millis(250));

        let missing = ConfigOverrides {
            interpreter: Some(dir.path().join("nope")),
            ..ConfigOverrides::default()
        };
        let settings = Settings::discover_from(dir.path(), &missing, no_env).unwrap();
        assert!(matches!(
            settings.runner_configuration(),
            Err(ConfigError::InterpreterNotFound { .. })
        ));
    }
}
