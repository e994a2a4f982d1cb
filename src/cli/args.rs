//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and all subcommand enums.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pyrunner_config::ConfigOverrides;

/// pyrunner - run Python scripts with captured output and a hard timeout
#[derive(Parser)]
#[command(name = "pyrunner")]
#[command(about = "Run Python scripts with captured output, a hard timeout and lifecycle events")]
#[command(long_about = r#"
pyrunner launches a Python interpreter as a child process, captures its standard
output and standard error, force-kills it when the timeout expires and reports
any text on standard error as a script failure.

EXAMPLES:
  # Run a script with two arguments
  pyrunner exec analyze.py data.csv "Second quoted example"

  # Use a specific interpreter and a 5 second timeout
  pyrunner --interpreter /opt/python3.12/bin/python3 --timeout-ms 5000 exec slow.py

  # Print the full result (stdout, stderr, exit code, timestamps) as JSON
  pyrunner --json exec report.py

  # Decode a base64 image printed by a plotting script
  pyrunner exec plot.py --payload-out plot.png

  # Prepare a virtual environment and install requirements
  pyrunner venv create --requirements requirements.txt

  # Show the effective configuration and where each value came from
  pyrunner config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > PYRUNNER_* env > config file > defaults
  Config file is discovered by searching upward from CWD for pyrunner.toml
  Use --config to specify an explicit config file path

EXIT CODES:
  0 success, 1 internal, 2 configuration, 3 script failed, 4 precondition,
  10 timeout, 70 runner failure, 130 cancelled
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Python interpreter to launch
    #[arg(long, global = true)]
    pub interpreter: Option<PathBuf>,

    /// Timeout in milliseconds (0 selects the default of 60000)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub timeout_ms: Option<i64>,

    /// Working directory for the child process
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Argument passed to the interpreter before the script (repeatable)
    #[arg(long = "interpreter-arg", global = true, allow_hyphen_values = true)]
    pub interpreter_args: Vec<String>,

    /// Argument passed to the py.exe launcher (repeatable, ignored for other interpreters)
    #[arg(long = "launcher-arg", global = true, allow_hyphen_values = true)]
    pub launcher_args: Vec<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration overrides carried by the global flags and subcommand.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            config_path: self.config.clone(),
            interpreter: self.interpreter.clone(),
            launcher_args: self.launcher_args.clone(),
            interpreter_args: self.interpreter_args.clone(),
            working_directory: self.cwd.clone(),
            timeout_ms: self.timeout_ms,
            ..ConfigOverrides::default()
        };

        if let Commands::Venv { path, command } = &self.command {
            overrides.environment_path.clone_from(path);
            if let VenvCommands::Create { requirements, .. } = command {
                overrides.requirements.clone_from(requirements);
            }
        }

        overrides
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script and print its output
    ///
    /// Standard output is printed on success. Any text on standard error
    /// fails the run with exit code 3; a timeout prints the partial output
    /// followed by the PYRUNNER TIMEOUT marker and exits with code 10.
    ///
    /// EXAMPLES:
    ///   pyrunner exec hello.py
    ///   pyrunner exec render.py 42 "Second \"quoted\" example"
    Exec {
        /// Script to run
        script: PathBuf,

        /// Arguments passed to the script verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Decode a base64 payload printed by the script and write the bytes here
        #[arg(long)]
        payload_out: Option<PathBuf>,
    },

    /// Run the interpreter with no script
    ///
    /// Useful with --interpreter-arg, e.g. `pyrunner --interpreter-arg=--version run`.
    Run,

    /// Manage the virtual environment
    #[command(subcommand_required = true)]
    Venv {
        /// Environment directory (default: <working directory>/.venv)
        #[arg(long)]
        path: Option<PathBuf>,

        #[command(subcommand)]
        command: VenvCommands,
    },

    /// Show the effective configuration and the source of each value
    Config,
}

/// Virtual environment subcommands
#[derive(Subcommand)]
pub enum VenvCommands {
    /// Create the environment (if missing), upgrade pip and install requirements
    ///
    /// EXAMPLES:
    ///   pyrunner venv create
    ///   pyrunner venv --path build/env create --requirements requirements.txt
    Create {
        /// Requirements file to install after creation
        #[arg(long, short)]
        requirements: Option<PathBuf>,

        /// Skip `pip install --upgrade pip`
        #[arg(long)]
        no_upgrade_pip: bool,
    },

    /// Install a requirements file into the existing environment
    Install {
        /// Requirements file
        requirements: PathBuf,
    },

    /// Delete the environment directory
    Delete,

    /// Print the environment interpreter path
    Path,
}

/// Build the clap command (used by tests and completions).
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
