//! Application service — the management boundary consumed by presentation.
//!
//! `ExtensionHost` ties the lifecycle manager, the installer, and the remote
//! index together. Every mutating call comes back as an `OperationReply`;
//! nothing crosses this boundary as an error.

use std::collections::BTreeMap;

use additions_common::{ExtensionInfo, LogTail, OperationReply, RemoteEntry};

use crate::application::ports::{
    ArchiveExtractor, ArchiveFetcher, CatalogStore, LocalFs, ManifestSource, ProcessLauncher,
    ProgressReporter, ViewOpener,
};
use crate::application::services::installer::BundleInstaller;
use crate::application::services::lifecycle::LifecycleManager;
use crate::domain::{Activation, ActivationError, RunStatus};

/// Default number of log lines returned by [`ExtensionHost::logs`].
pub const DEFAULT_LOG_LINES: usize = 100;

pub struct ExtensionHost<S, M, L: ProcessLauncher, V, N, X, F> {
    manager: LifecycleManager<S, M, L, V>,
    installer: BundleInstaller<N, X, F>,
    remote: BTreeMap<String, RemoteEntry>,
}

impl<S, M, L, V, N, X, F> ExtensionHost<S, M, L, V, N, X, F>
where
    S: CatalogStore,
    M: ManifestSource,
    L: ProcessLauncher,
    V: ViewOpener,
    N: ArchiveFetcher,
    X: ArchiveExtractor,
    F: LocalFs,
{
    pub fn new(
        manager: LifecycleManager<S, M, L, V>,
        installer: BundleInstaller<N, X, F>,
        remote: BTreeMap<String, RemoteEntry>,
    ) -> Self {
        Self {
            manager,
            installer,
            remote,
        }
    }

    pub fn manager(&self) -> &LifecycleManager<S, M, L, V> {
        &self.manager
    }

    pub async fn list(&self) -> Vec<ExtensionInfo> {
        self.manager.list().await
    }

    pub async fn info(&self, name: &str) -> Option<ExtensionInfo> {
        self.manager.info(name).await
    }

    pub async fn status(&self, name: &str) -> RunStatus {
        self.manager.status(name).await
    }

    /// Start `name` and keep the typed outcome, for callers that need the pid.
    ///
    /// # Errors
    ///
    /// See [`ActivationError`].
    pub async fn activate(&self, name: &str) -> Result<Activation, ActivationError> {
        self.manager.start(name).await.inspect_err(|err| {
            tracing::warn!(bundle = name, error = %err, "activation failed");
        })
    }

    pub async fn start(&self, name: &str) -> OperationReply {
        match self.activate(name).await {
            Ok(Activation::Spawned { pid }) => OperationReply::ok(match pid {
                Some(pid) => format!("Extension '{name}' started (pid {pid})."),
                None => format!("Extension '{name}' started."),
            }),
            Ok(Activation::Opened { target }) => {
                OperationReply::ok(format!("Extension '{name}' opened: {target}"))
            }
            Ok(Activation::AlreadyRunning { .. }) => {
                OperationReply::ok(format!("Extension '{name}' is already running."))
            }
            Err(err) => OperationReply::failed(err.to_string()),
        }
    }

    pub async fn stop(&self, name: &str) -> OperationReply {
        if self.manager.stop(name).await {
            OperationReply::ok(format!("Extension '{name}' stopped."))
        } else {
            OperationReply::failed(format!("Extension '{name}' has no running process."))
        }
    }

    pub async fn dismiss(&self, name: &str) -> OperationReply {
        if self.manager.dismiss(name).await {
            OperationReply::ok(format!("Extension '{name}' closed."))
        } else {
            OperationReply::failed(format!("Extension '{name}' has no open view."))
        }
    }

    /// Install or replace `name`. A running process is stopped once the
    /// download has succeeded, before its directory is replaced.
    pub async fn install(
        &self,
        name: &str,
        url: &str,
        reporter: &impl ProgressReporter,
    ) -> OperationReply {
        if url.trim().is_empty() {
            return OperationReply::failed("URL not specified.");
        }
        let result = self
            .installer
            .install_with(
                self.manager.catalog(),
                name,
                url,
                reporter,
                self.stop_for(name, "reinstall"),
            )
            .await;
        self.manager.sync_catalog();
        match result {
            Ok(()) => OperationReply::ok(format!("Extension '{name}' installed.")),
            Err(err) => {
                tracing::warn!(bundle = name, error = %err, "install failed");
                OperationReply::failed(err.to_string())
            }
        }
    }

    /// Remove `name`, stopping its process first if it is running.
    ///
    /// Nothing is stopped when `name` is unknown or the catalog is unreadable.
    pub async fn remove(&self, name: &str) -> OperationReply {
        let result = self
            .installer
            .remove_with(self.manager.catalog(), name, self.stop_for(name, "removal"))
            .await;
        match result {
            Ok(()) => {
                self.manager.forget(name);
                self.manager.sync_catalog();
                OperationReply::ok(format!("Extension '{name}' removed."))
            }
            Err(err) => {
                tracing::warn!(bundle = name, error = %err, "remove failed");
                OperationReply::failed(err.to_string())
            }
        }
    }

    async fn stop_for(&self, name: &str, reason: &str) {
        if self.manager.stop(name).await {
            tracing::info!(bundle = name, reason, "stopped");
        }
    }

    /// Bundles offered for installation.
    pub fn remote(&self) -> &BTreeMap<String, RemoteEntry> {
        &self.remote
    }

    /// Last `lines` lines of the captured output of `name`.
    ///
    /// Returns `None` for names outside the catalog. A bundle that never
    /// produced output yields an empty tail.
    pub async fn logs(&self, name: &str, lines: usize) -> Option<LogTail> {
        self.manager.info(name).await?;
        let content = self
            .manager
            .log_path(name)
            .filter(|path| self.installer.fs().exists(path))
            .and_then(|path| match self.installer.fs().read_to_string(&path) {
                Ok(content) => Some(content),
                Err(err) => {
                    tracing::warn!(bundle = name, error = format!("{err:#}"), "log unreadable");
                    None
                }
            })
            .unwrap_or_default();
        Some(LogTail {
            name: name.to_string(),
            lines: tail(&content, lines),
        })
    }

    /// Stop every running process. Called once on host teardown.
    pub async fn shutdown(&self) {
        let stopped = self.manager.shutdown().await;
        if stopped > 0 {
            tracing::info!(stopped, "stopped running extensions");
        }
    }
}

fn tail(content: &str, lines: usize) -> Vec<String> {
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].iter().map(|line| (*line).to_string()).collect()
}
