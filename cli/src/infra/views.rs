//! Infrastructure implementations of the `ViewOpener` port.
//!
//! `SystemOpener` hands documents and URLs to the desktop's default handler.
//! `ChannelOpener` forwards requests over a tokio channel so the endpoint
//! never waits on the desktop; [`dispatch_views`] drains that channel.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::application::ports::{CommandRunner, ViewOpener};
use crate::domain::ViewRequest;
use crate::infra::command_runner::TokioCommandRunner;

/// Program and leading arguments of the platform's "open this" command.
fn opener_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(windows) {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}

/// Opens views with `xdg-open`, `open` or `start` in a background task.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener {
    runner: TokioCommandRunner,
}

impl SystemOpener {
    #[must_use]
    pub fn new(runner: TokioCommandRunner) -> Self {
        Self { runner }
    }

    /// Open `request` and wait for the opener program to return.
    ///
    /// # Errors
    ///
    /// Returns an error if the opener cannot be run or reports failure.
    pub async fn open_now(&self, request: &ViewRequest) -> Result<()> {
        let (program, leading) = opener_command();
        let location = request.target.location();
        let mut args: Vec<&str> = leading.to_vec();
        args.push(&location);
        let output = self.runner.run(program, &args).await?;
        anyhow::ensure!(
            output.status.success(),
            "{program} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        tracing::debug!(bundle = %request.label, %location, "view opened");
        Ok(())
    }
}

impl ViewOpener for SystemOpener {
    fn open(&self, request: &ViewRequest) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .context("no async runtime to open views on")?;
        let opener = *self;
        let request = request.clone();
        handle.spawn(async move {
            if let Err(e) = opener.open_now(&request).await {
                tracing::warn!(bundle = %request.label, error = format!("{e:#}"), "view not opened");
            }
        });
        Ok(())
    }
}

/// Queues view requests for a dispatcher task.
#[derive(Debug, Clone)]
pub struct ChannelOpener {
    tx: mpsc::UnboundedSender<ViewRequest>,
}

impl ChannelOpener {
    /// Create an opener and the receiving half its requests arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ViewOpener for ChannelOpener {
    fn open(&self, request: &ViewRequest) -> Result<()> {
        self.tx
            .send(request.clone())
            .map_err(|_| anyhow::anyhow!("view dispatcher is not running"))
    }
}

/// Hand queued requests to `opener` one at a time until every sender is dropped.
pub async fn dispatch_views(mut rx: mpsc::UnboundedReceiver<ViewRequest>, opener: SystemOpener) {
    while let Some(request) = rx.recv().await {
        tracing::info!(bundle = %request.label, target = %request.target.location(), "open view");
        if let Err(e) = opener.open_now(&request).await {
            tracing::warn!(bundle = %request.label, error = format!("{e:#}"), "view not opened");
        }
    }
}
