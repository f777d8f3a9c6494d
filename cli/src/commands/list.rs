//! `additions list` — show installed extensions and their status.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::infra::views::SystemOpener;

/// Run `additions list`.
///
/// # Errors
///
/// Returns an error if output cannot be rendered.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let host = app.host(SystemOpener::default());
    let extensions = host.list().await;
    app.renderer().render_list(&extensions)?;
    Ok(ExitCode::SUCCESS)
}
