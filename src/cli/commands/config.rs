//! `config` command handler

use anyhow::Result;

use super::json_emit::emit_config_json;
use crate::{ExitCode, Settings};

/// Execute `pyrunner config`.
pub fn execute_config_command(settings: &Settings, json: bool) -> Result<ExitCode> {
    let effective = settings.effective_config();

    if json {
        println!("{}", emit_config_json(&effective)?);
        return Ok(ExitCode::SUCCESS);
    }

    match &settings.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none)"),
    }
    println!();

    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  [{source}]");
    }

    Ok(ExitCode::SUCCESS)
}
