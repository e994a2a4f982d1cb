//! `venv` command handlers

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::cli::args::VenvCommands;
use crate::{EnvironmentBootstrap, ExitCode, Settings};

/// Execute `pyrunner venv <command>`.
pub async fn execute_venv_command(
    settings: &Settings,
    command: VenvCommands,
    json: bool,
) -> Result<ExitCode> {
    let bootstrap = EnvironmentBootstrap::from_settings(settings)?;
    let cancel = CancellationToken::new();

    match command {
        VenvCommands::Create { no_upgrade_pip, .. } => {
            let bootstrap = if no_upgrade_pip {
                bootstrap.with_upgrade_pip(false)
            } else {
                bootstrap
            };
            let config = bootstrap
                .create_async(settings.environment.requirements.clone(), cancel)
                .await?;
            emit_interpreter(config.interpreter().display().to_string(), json);
        }
        VenvCommands::Install { requirements } => {
            bootstrap
                .install_requirements_async(requirements, cancel)
                .await?;
            println!("✓ Requirements installed");
        }
        VenvCommands::Delete => {
            if bootstrap.delete()? {
                println!(
                    "✓ Deleted {}",
                    bootstrap.environment_directory().display()
                );
            } else {
                println!(
                    "No environment at {}",
                    bootstrap.environment_directory().display()
                );
            }
        }
        VenvCommands::Path => {
            emit_interpreter(
                bootstrap.environment_interpreter().display().to_string(),
                json,
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn emit_interpreter(interpreter: String, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "interpreter": interpreter }));
    } else {
        println!("{interpreter}");
    }
}
