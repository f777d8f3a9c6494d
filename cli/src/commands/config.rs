//! `additions config` — show and set configuration values.

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use additions_common::OperationReply;

use crate::app::AppContext;
use crate::application::services::config_service;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key (root, listen, python, stop_grace_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let path = app.config_path()?;
    app.renderer().render_config(&app.config, &path, &app.root)?;
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_config_value(&app.config_store, key, value)?;
    if app.is_json() {
        app.renderer()
            .render_reply(&OperationReply::ok(format!("Set {key} = {value}")))?;
    } else {
        app.output.success(&format!("Set {key} = {value}"));
    }
    Ok(ExitCode::SUCCESS)
}
