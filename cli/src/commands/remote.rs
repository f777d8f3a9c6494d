//! `additions remote` — list extensions available for installation.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;

/// Run `additions remote`.
///
/// # Errors
///
/// Returns an error if output cannot be rendered.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    app.renderer().render_remote(&app.config.remote)?;
    Ok(ExitCode::SUCCESS)
}
