//! `additions remove` — uninstall an extension.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::commands::NameArgs;
use crate::infra::views::SystemOpener;

/// Run `additions remove <name>`.
///
/// # Errors
///
/// Returns an error if the confirmation prompt fails.
pub async fn run(app: &AppContext, args: &NameArgs) -> Result<ExitCode> {
    if !app.is_json()
        && !app.confirm(&format!("Remove extension '{}' and its files?", args.name), true)?
    {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let host = app.host(SystemOpener::default());
    let reply = host.remove(&args.name).await;
    app.renderer().render_reply(&reply)?;
    Ok(if reply.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
