//! Infrastructure implementation of the `ProcessLauncher` port.
//!
//! Bundles are spawned with `tokio::process` so a stop can wait for exit
//! without blocking a runtime thread. Output is appended to the bundle's log
//! file; `kill_on_drop` makes sure a dropped handle never leaves an orphan.

use std::fs::OpenOptions;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LaunchSpec, ProcessLauncher, SupervisedChild};
use crate::infra::command_runner::TokioCommandRunner;

/// Spawns bundle processes on the current tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher {
    runner: TokioCommandRunner,
}

impl TokioLauncher {
    #[must_use]
    pub fn new(runner: TokioCommandRunner) -> Self {
        Self { runner }
    }
}

impl ProcessLauncher for TokioLauncher {
    type Child = TokioChild;

    fn spawn(&self, spec: &LaunchSpec) -> Result<TokioChild> {
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(spec.env.iter().cloned())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match &spec.log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                let stderr = file
                    .try_clone()
                    .with_context(|| format!("duplicating {}", path.display()))?;
                command.stdout(Stdio::from(file)).stderr(Stdio::from(stderr));
            }
            None => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program.display()))?;
        tracing::debug!(
            bundle = %spec.name,
            program = %spec.program.display(),
            cwd = %spec.working_dir.display(),
            pid = child.id(),
            "spawned"
        );
        Ok(TokioChild {
            child,
            runner: self.runner,
        })
    }
}

/// A supervised bundle process.
#[derive(Debug)]
pub struct TokioChild {
    child: tokio::process::Child,
    runner: TokioCommandRunner,
}

impl SupervisedChild for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self, grace: Duration) -> Result<()> {
        if self.has_exited() {
            return Ok(());
        }
        if let Err(e) = request_exit(self.runner, self.child.id()).await {
            tracing::debug!(error = format!("{e:#}"), "graceful stop request failed");
        }
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(%status, "exited after stop request");
                Ok(())
            }
            Ok(Err(e)) => Err(e).context("waiting for process"),
            Err(_) => {
                tracing::debug!(grace_ms = grace.as_millis(), "still alive, killing");
                self.child.kill().await.context("killing process")
            }
        }
    }
}

/// Ask the process to exit. Only unix has a polite request; elsewhere the
/// grace period is spent waiting for a natural exit before the kill.
async fn request_exit(runner: TokioCommandRunner, pid: Option<u32>) -> Result<()> {
    #[cfg(unix)]
    if let Some(pid) = pid {
        let output = runner.run("kill", &["-TERM", &pid.to_string()]).await?;
        anyhow::ensure!(
            output.status.success(),
            "kill -TERM {pid}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    #[cfg(not(unix))]
    let _ = (runner, pid);
    Ok(())
}
