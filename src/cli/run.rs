//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments and initialises logging
//! - Discovers Settings
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::{ExitCode, PyRunnerError, Settings, UserFriendlyError};
use pyrunner_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// This function handles ALL output including errors. It returns `Result<(), ExitCode>`:
/// - On success: returns `Ok(())` after printing any output
/// - On failure: prints the error report, returns `Err(ExitCode)`
///
/// main.rs only calls `std::process::exit(code.as_i32())` on error - it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging unavailable: {e}");
    }

    let settings = match Settings::discover(&cli.overrides()) {
        Ok(settings) => settings,
        Err(err) => {
            let err = PyRunnerError::from(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let json = cli.json;
    let result = match cli.command {
        Commands::Exec {
            script,
            args,
            payload_out,
        } => commands::execute_exec_command(
            &settings,
            script,
            args,
            payload_out.as_deref(),
            json,
        ),
        Commands::Run => commands::execute_run_command(&settings, json),
        Commands::Config => commands::execute_config_command(&settings, json),
        Commands::Venv { command, .. } => {
            // Create tokio runtime for the async bootstrap
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("✗ Failed to create async runtime: {e}");
                    return Err(ExitCode::INTERNAL);
                }
            };
            rt.block_on(commands::execute_venv_command(&settings, command, json))
        }
    };

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => {
            if let Some(err) = error.downcast_ref::<PyRunnerError>() {
                eprintln!("{}", err.display_for_user());
                return Err(err.to_exit_code());
            }

            eprintln!("✗ Unexpected error: {error:#}");
            if cli.verbose {
                eprintln!("{error:?}");
            } else {
                eprintln!("\n  Run with --verbose for more detailed output");
            }
            Err(ExitCode::INTERNAL)
        }
    }
}
