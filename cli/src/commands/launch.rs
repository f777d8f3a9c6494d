//! `additions launch` — start an extension in the foreground.
//!
//! Process-backed extensions keep the command attached until the process
//! exits or Ctrl-C is pressed, which stops it. Documents and URLs are handed
//! to the desktop and the command returns once they are opened.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::NameArgs;
use crate::domain::Activation;
use crate::infra::views::{ChannelOpener, SystemOpener, dispatch_views};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Run `additions launch <name>`.
///
/// # Errors
///
/// Returns an error if the extension cannot be activated.
pub async fn run(app: &AppContext, args: &NameArgs) -> Result<ExitCode> {
    let name = args.name.as_str();
    let (views, rx) = ChannelOpener::channel();
    let dispatcher = tokio::spawn(dispatch_views(rx, SystemOpener::default()));
    let host = app.host(views);

    let activation = host.activate(name).await?;
    match &activation {
        Activation::Spawned { pid } | Activation::AlreadyRunning { pid } => {
            let pid = pid.map_or_else(|| "?".to_string(), |p| p.to_string());
            app.output
                .success(&format!("{name} running (pid {pid}). Press Ctrl-C to stop."));

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    signal = &mut ctrl_c => {
                        if let Err(e) = signal {
                            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                        }
                        host.stop(name).await;
                        app.output.success(&format!("{name} stopped."));
                        break;
                    }
                    () = tokio::time::sleep(EXIT_POLL_INTERVAL) => {
                        if host.manager().reap(name).await {
                            app.output.info(&format!("{name} exited."));
                            break;
                        }
                    }
                }
            }
        }
        Activation::Opened { target } => {
            app.output.success(&format!("{name} opened: {target}"));
        }
    }

    // Dropping the host closes the channel; the dispatcher finishes pending opens.
    drop(host);
    if let Err(e) = dispatcher.await {
        tracing::warn!(error = %e, "view dispatcher stopped unexpectedly");
    }
    Ok(ExitCode::SUCCESS)
}
