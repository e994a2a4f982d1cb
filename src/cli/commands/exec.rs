//! `exec` and `run` command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::json_emit::emit_result_json;
use crate::{ExecutionResult, ExitCode, Invocation, PyRunnerError, PythonRunner, Settings};

/// Exit code for a completed invocation.
///
/// Timeout wins over standard error, matching how the result is classified.
#[must_use]
pub fn result_exit_code(result: &ExecutionResult) -> ExitCode {
    if result.timed_out {
        ExitCode::TIMEOUT
    } else if result.has_error_output() {
        ExitCode::SCRIPT_FAILED
    } else {
        ExitCode::SUCCESS
    }
}

/// Execute `pyrunner exec <script> [args..]`.
pub fn execute_exec_command(
    settings: &Settings,
    script: PathBuf,
    args: Vec<String>,
    payload_out: Option<&Path>,
    json: bool,
) -> Result<ExitCode> {
    let runner = runner_from(settings)?;
    let invocation = Invocation::new(script).args(args);

    if let Some(out) = payload_out {
        let bytes = runner.execute_payload(&invocation)?;
        std::fs::write(out, &bytes)
            .with_context(|| format!("Failed to write payload to {}", out.display()))?;
        println!("Wrote {} bytes to {}", bytes.len(), out.display());
        return Ok(ExitCode::SUCCESS);
    }

    report(&runner, &invocation, json)
}

/// Execute `pyrunner run` (bare interpreter).
pub fn execute_run_command(settings: &Settings, json: bool) -> Result<ExitCode> {
    let runner = runner_from(settings)?;
    report(&runner, &Invocation::bare(), json)
}

fn runner_from(settings: &Settings) -> Result<PythonRunner> {
    let config = settings
        .runner_configuration()
        .map_err(PyRunnerError::from)?;
    Ok(PythonRunner::new(config))
}

fn report(runner: &PythonRunner, invocation: &Invocation, json: bool) -> Result<ExitCode> {
    let result = runner.run_with(invocation).map_err(PyRunnerError::from)?;
    let code = result_exit_code(&result);

    if json {
        println!("{}", emit_result_json(&result)?);
        return Ok(code);
    }

    let timed_out = result.timed_out;
    let text = result.into_text().map_err(PyRunnerError::from)?;
    if !text.is_empty() {
        println!("{text}");
    }
    if timed_out {
        eprintln!(
            "✗ Timed out after {} ms; output above is partial",
            runner.config().timeout().as_millis()
        );
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_exit_code() {
        assert_eq!(
            result_exit_code(&ExecutionResult::new("ok", "", 0, false)),
            ExitCode::SUCCESS
        );
        assert_eq!(
            result_exit_code(&ExecutionResult::new("", "Traceback", 1, false)),
            ExitCode::SCRIPT_FAILED
        );
        assert_eq!(
            result_exit_code(&ExecutionResult::new("", "", 2, false)),
            ExitCode::SUCCESS
        );
        assert_eq!(
            result_exit_code(&ExecutionResult::new("partial", "noise", 137, true)),
            ExitCode::TIMEOUT
        );
    }
}
