//! CLI command implementations (facade).
//!
//! Handlers return the process exit code for runs that completed but did not
//! succeed (script failure, timeout); hard failures come back as errors.

mod config;
mod exec;
mod json_emit;
mod venv;

pub use config::execute_config_command;
pub use exec::{execute_exec_command, execute_run_command, result_exit_code};
pub use json_emit::{emit_config_json, emit_result_json};
pub use venv::execute_venv_command;
