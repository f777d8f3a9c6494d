//! `additions install` — download and register an extension.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::infra::views::SystemOpener;
use crate::output::{TerminalReporter, TracingReporter, progress};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Name to install the extension under
    pub name: String,

    /// Archive URL (zip or tar.gz). Defaults to the configured remote entry.
    #[arg(long)]
    pub url: Option<String>,
}

/// Run `additions install <name>`.
///
/// # Errors
///
/// Returns an error if the reply cannot be rendered.
pub async fn run(app: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    let url = args
        .url
        .clone()
        .or_else(|| app.config.remote.get(&args.name).map(|entry| entry.url.clone()))
        .unwrap_or_default();

    let host = app.host(SystemOpener::default());
    if app.is_json() {
        let reply = host.install(&args.name, &url, &TracingReporter).await;
        app.renderer().render_reply(&reply)?;
        return Ok(exit_code(reply.success));
    }

    let reporter = TerminalReporter::new(&app.output);
    let reporter = if app.output.show_progress() {
        reporter.with_spinner(progress::spinner(&format!("installing {}...", args.name)))
    } else {
        reporter
    };
    let reply = host.install(&args.name, &url, &reporter).await;
    reporter.clear();

    if reply.success {
        app.output
            .info(&format!("Start it: additions launch \"{}\"", args.name));
    } else {
        app.output.error(&reply.message);
        if url.trim().is_empty() {
            app.output
                .info("Pass --url <archive> or add it under `remote:` in the config file.");
        }
    }
    Ok(exit_code(reply.success))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
