//! `additions logs` — show captured output of an extension's process.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::host::DEFAULT_LOG_LINES;
use crate::infra::views::SystemOpener;

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    /// Extension name
    pub name: String,

    /// Number of trailing lines to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LINES)]
    pub lines: usize,
}

/// Run `additions logs <name>`.
///
/// # Errors
///
/// Returns an error if the extension is not installed.
pub async fn run(app: &AppContext, args: &LogsArgs) -> Result<ExitCode> {
    let host = app.host(SystemOpener::default());
    let Some(tail) = host.logs(&args.name, args.lines).await else {
        anyhow::bail!("Extension '{}' not found.", args.name);
    };
    app.renderer().render_logs(&tail)?;
    Ok(ExitCode::SUCCESS)
}
