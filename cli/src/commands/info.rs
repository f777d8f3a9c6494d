//! `additions info` — show one extension in detail.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::commands::NameArgs;
use crate::infra::views::SystemOpener;

/// Run `additions info <name>`.
///
/// # Errors
///
/// Returns an error if the extension is not installed.
pub async fn run(app: &AppContext, args: &NameArgs) -> Result<ExitCode> {
    let host = app.host(SystemOpener::default());
    let Some(info) = host.info(&args.name).await else {
        anyhow::bail!("Extension '{}' not found.", args.name);
    };
    app.renderer().render_info(&info)?;
    Ok(ExitCode::SUCCESS)
}
