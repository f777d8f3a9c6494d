//! Lifecycle manager — per-bundle run/stop state machine and process supervision.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Every catalog entry owns one `RuntimeState` slot guarded by its own async
//! mutex, so `start`/`stop` on different names never wait on each other while
//! calls for the same name are serialized. `start` publishes the child handle
//! into the slot before it returns, so a racing `stop` sees either the full
//! handle or nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use additions_common::ExtensionInfo;

use crate::application::ports::{
    CatalogStore, LaunchSpec, ManifestSource, ProcessLauncher, SupervisedChild, ViewOpener,
};
use crate::domain::bundle::ROOT_ENV_VAR;
use crate::domain::{
    Activation, ActivationError, ActivationKind, BundleRecord, Catalog, HostConfig, LoadError,
    Manifest, RunStatus, ViewRequest, ViewTarget,
};

/// Directory under the bundle root that collects captured process output.
pub const LOG_DIR_NAME: &str = ".logs";

/// Fixed parameters of a manager instance.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Bundle root; catalog paths are relative to it.
    pub root: PathBuf,
    /// Interpreter for `python` bundles.
    pub python: String,
    /// How long a child gets to exit after the polite request.
    pub stop_grace: Duration,
    /// Where child output is appended, one file per bundle.
    pub log_dir: Option<PathBuf>,
}

impl ManagerSettings {
    #[must_use]
    pub fn from_config(root: PathBuf, config: &HostConfig) -> Self {
        let log_dir = Some(root.join(LOG_DIR_NAME));
        Self {
            root,
            python: config.python.clone(),
            stop_grace: config.stop_grace(),
            log_dir,
        }
    }
}

/// Transient per-bundle state. `child` is only ever `Some` while `Running`.
struct RuntimeState<C> {
    status: RunStatus,
    child: Option<C>,
}

impl<C> Default for RuntimeState<C> {
    fn default() -> Self {
        Self {
            status: RunStatus::Stopped,
            child: None,
        }
    }
}

type Slot<C> = Arc<tokio::sync::Mutex<RuntimeState<C>>>;

/// Owns all runtime state and spawned children for one bundle root.
pub struct LifecycleManager<S, M, L: ProcessLauncher, V> {
    catalog: S,
    manifests: M,
    launcher: L,
    views: V,
    settings: ManagerSettings,
    runtime: Mutex<HashMap<String, Slot<L::Child>>>,
}

impl<S, M, L, V> LifecycleManager<S, M, L, V>
where
    S: CatalogStore,
    M: ManifestSource,
    L: ProcessLauncher,
    V: ViewOpener,
{
    /// Build a manager and create a `Stopped` slot for every catalog entry.
    pub fn new(catalog: S, manifests: M, launcher: L, views: V, settings: ManagerSettings) -> Self {
        let manager = Self {
            catalog,
            manifests,
            launcher,
            views,
            settings,
            runtime: Mutex::new(HashMap::new()),
        };
        manager.sync_catalog();
        manager
    }

    pub fn catalog(&self) -> &S {
        &self.catalog
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Reconcile runtime slots with the persisted catalog.
    ///
    /// New names get a `Stopped` slot. Slots whose name left the catalog are
    /// dropped unless they still own a child process.
    pub fn sync_catalog(&self) -> Catalog {
        let catalog = self.load_catalog();
        let mut runtime = self.runtime_map();
        for record in catalog.records() {
            runtime.entry(record.name).or_default();
        }
        runtime.retain(|name, slot| {
            catalog.contains(name) || slot.try_lock().map_or(true, |state| state.child.is_some())
        });
        catalog
    }

    /// Drop the runtime slot for `name`. Callers stop the bundle first.
    pub fn forget(&self, name: &str) {
        self.runtime_map().remove(name);
    }

    /// Every catalog entry with its display fields and status, in name order.
    ///
    /// A missing or malformed manifest degrades its own entry only.
    pub async fn list(&self) -> Vec<ExtensionInfo> {
        let catalog = self.sync_catalog();
        let mut entries = Vec::with_capacity(catalog.len());
        for record in catalog.records() {
            let status = self.status(&record.name).await;
            entries.push(self.describe(&record, status));
        }
        entries
    }

    /// Single-entry view, `None` when `name` is not in the catalog.
    pub async fn info(&self, name: &str) -> Option<ExtensionInfo> {
        let record = self.load_catalog().get(name)?;
        let status = self.status(name).await;
        Some(self.describe(&record, status))
    }

    /// Current run state. Unknown names are reported as `Stopped`.
    pub async fn status(&self, name: &str) -> RunStatus {
        match self.slot(name) {
            Some(slot) => slot.lock().await.status,
            None => RunStatus::Stopped,
        }
    }

    /// Activate a bundle according to its manifest.
    ///
    /// Starting a bundle that is already running re-opens its companion view
    /// and returns the existing handle instead of spawning again. A tracked
    /// child that has exited on its own is reaped and started afresh.
    ///
    /// # Errors
    ///
    /// Returns an `ActivationError` and leaves the bundle `Stopped` when the
    /// name is unknown, the entry point is missing, the kind is unsupported,
    /// or the process/view cannot be launched.
    pub async fn start(&self, name: &str) -> Result<Activation, ActivationError> {
        let Some(record) = self.load_catalog().get(name) else {
            return Err(ActivationError::NotFound(name.to_string()));
        };
        let slot = self.slot_or_insert(name);
        let mut state = slot.lock().await;

        let bundle_dir = absolute(&record.resolve(&self.settings.root));
        let manifest = self.manifests.load(&bundle_dir).unwrap_or_else(|err| {
            tracing::warn!(bundle = name, error = %err, "manifest unavailable");
            Manifest::degraded()
        });

        if state.status.is_running() {
            if state.child.as_mut().is_some_and(SupervisedChild::has_exited) {
                tracing::info!(bundle = name, "process exited on its own, starting again");
                *state = RuntimeState::default();
            } else {
                tracing::info!(bundle = name, "already running");
                self.open_companion(name, &manifest);
                return Ok(Activation::AlreadyRunning {
                    pid: state.child.as_ref().and_then(SupervisedChild::id),
                });
            }
        }

        let activation = match &manifest.activation_kind {
            ActivationKind::Process => {
                let entry = self.resolve_entry(&bundle_dir, &manifest)?;
                let spec = self.launch_spec(
                    name,
                    PathBuf::from(&self.settings.python),
                    vec![entry.display().to_string()],
                    &bundle_dir,
                );
                self.spawn_into(&mut state, &spec, &manifest)?
            }
            ActivationKind::Executable => {
                let entry = self.resolve_entry(&bundle_dir, &manifest)?;
                let spec = self.launch_spec(name, entry, Vec::new(), &bundle_dir);
                self.spawn_into(&mut state, &spec, &manifest)?
            }
            ActivationKind::Document => {
                let entry = self.resolve_entry(&bundle_dir, &manifest)?;
                let target = ViewTarget::Document(entry);
                self.open_view(name, target.clone())?;
                state.status = RunStatus::Running;
                Activation::Opened {
                    target: target.location(),
                }
            }
            ActivationKind::Remote => {
                let url = manifest
                    .entry_point
                    .clone()
                    .ok_or_else(|| ActivationError::MissingTarget(name.to_string()))?;
                self.open_view(name, ViewTarget::Url(url.clone()))?;
                state.status = RunStatus::Running;
                Activation::Opened { target: url }
            }
            ActivationKind::Unrecognized(kind) => {
                return Err(ActivationError::UnsupportedKind {
                    name: name.to_string(),
                    kind: kind.clone(),
                });
            }
        };

        tracing::info!(
            bundle = name,
            kind = manifest.activation_kind.as_based_on(),
            pid = activation.pid(),
            "started"
        );
        Ok(activation)
    }

    /// Terminate the tracked child process of `name`.
    ///
    /// Returns `false` when there is no child to stop: never started, already
    /// stopped, or a document/remote activation (see [`Self::dismiss`]).
    pub async fn stop(&self, name: &str) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };
        let mut state = slot.lock().await;
        let Some(mut child) = state.child.take() else {
            return false;
        };

        let pid = child.id();
        if let Err(err) = child.terminate(self.settings.stop_grace).await {
            tracing::warn!(bundle = name, pid, error = format!("{err:#}"), "terminate failed");
        }
        state.status = RunStatus::Stopped;
        tracing::info!(bundle = name, pid, "stopped");
        true
    }

    /// Clear `Running` for an activation that owns no process.
    ///
    /// Returns `false` for stopped bundles and for process-backed ones,
    /// which must go through [`Self::stop`].
    pub async fn dismiss(&self, name: &str) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };
        let mut state = slot.lock().await;
        if state.status.is_running() && state.child.is_none() {
            state.status = RunStatus::Stopped;
            tracing::info!(bundle = name, "dismissed");
            true
        } else {
            false
        }
    }

    /// Clear the state of a process that exited on its own.
    ///
    /// Returns `true` when `name` had a tracked child that is no longer alive;
    /// the bundle is `Stopped` afterwards.
    pub async fn reap(&self, name: &str) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };
        let mut state = slot.lock().await;
        if !state.child.as_mut().is_some_and(SupervisedChild::has_exited) {
            return false;
        }
        *state = RuntimeState::default();
        tracing::info!(bundle = name, "process exited");
        true
    }

    /// Stop every process-backed bundle. Returns how many were stopped.
    pub async fn shutdown(&self) -> usize {
        let names: Vec<String> = self.runtime_map().keys().cloned().collect();
        let mut stopped = 0;
        for name in names {
            if self.stop(&name).await {
                stopped += 1;
            }
        }
        stopped
    }

    /// Captured output file for `name`, when output capture is enabled.
    #[must_use]
    pub fn log_path(&self, name: &str) -> Option<PathBuf> {
        self.settings
            .log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}.log")))
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn load_catalog(&self) -> Catalog {
        self.catalog.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "catalog unreadable, treating as empty");
            Catalog::new()
        })
    }

    fn runtime_map(&self) -> MutexGuard<'_, HashMap<String, Slot<L::Child>>> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, name: &str) -> Option<Slot<L::Child>> {
        self.runtime_map().get(name).cloned()
    }

    fn slot_or_insert(&self, name: &str) -> Slot<L::Child> {
        Arc::clone(self.runtime_map().entry(name.to_string()).or_default())
    }

    fn describe(&self, record: &BundleRecord, status: RunStatus) -> ExtensionInfo {
        let bundle_dir = record.resolve(&self.settings.root);
        let (manifest, degraded) = match self.manifests.load(&bundle_dir) {
            Ok(manifest) => (manifest, None),
            Err(err) => {
                tracing::warn!(bundle = %record.name, error = %err, "listing degraded bundle");
                let reason = match &err {
                    LoadError::NotFound(_) => "manifest not found".to_string(),
                    LoadError::Invalid { reason, .. } => format!("invalid manifest: {reason}"),
                };
                (Manifest::degraded(), Some(reason))
            }
        };
        ExtensionInfo {
            name: record.name.clone(),
            path: record.relative_path.clone(),
            description: manifest.description,
            version: manifest.version,
            based_on: manifest.activation_kind.as_based_on().to_string(),
            running: status.is_running(),
            degraded,
            logo: manifest.logo,
            link: manifest.companion_url,
        }
    }

    fn resolve_entry(
        &self,
        bundle_dir: &Path,
        manifest: &Manifest,
    ) -> Result<PathBuf, ActivationError> {
        let Some(entry) = manifest.entry_point.as_deref() else {
            return Err(ActivationError::EntryMissing(bundle_dir.to_path_buf()));
        };
        let path = bundle_dir.join(entry);
        tracing::debug!(path = %path.display(), "resolved entry point");
        if self.manifests.entry_exists(&path) {
            Ok(path)
        } else {
            Err(ActivationError::EntryMissing(path))
        }
    }

    fn launch_spec(
        &self,
        name: &str,
        program: PathBuf,
        args: Vec<String>,
        bundle_dir: &Path,
    ) -> LaunchSpec {
        LaunchSpec {
            name: name.to_string(),
            program,
            args,
            working_dir: bundle_dir.to_path_buf(),
            env: vec![(
                ROOT_ENV_VAR.to_string(),
                absolute(&self.settings.root).display().to_string(),
            )],
            log_file: self.log_path(name),
        }
    }

    fn spawn_into(
        &self,
        state: &mut RuntimeState<L::Child>,
        spec: &LaunchSpec,
        manifest: &Manifest,
    ) -> Result<Activation, ActivationError> {
        let child = self
            .launcher
            .spawn(spec)
            .map_err(|err| ActivationError::SpawnFailed {
                name: spec.name.clone(),
                reason: format!("{err:#}"),
            })?;
        let pid = child.id();
        state.child = Some(child);
        state.status = RunStatus::Running;
        self.open_companion(&spec.name, manifest);
        Ok(Activation::Spawned { pid })
    }

    fn open_view(&self, name: &str, target: ViewTarget) -> Result<(), ActivationError> {
        self.views
            .open(&ViewRequest {
                label: name.to_string(),
                target,
            })
            .map_err(|err| ActivationError::ViewFailed {
                name: name.to_string(),
                reason: format!("{err:#}"),
            })
    }

    /// The process is already running at this point, so a failed companion
    /// view is logged rather than turned into an activation error.
    fn open_companion(&self, name: &str, manifest: &Manifest) {
        if let Some(url) = &manifest.companion_url
            && let Err(err) = self.open_view(name, ViewTarget::Url(url.clone()))
        {
            tracing::warn!(bundle = name, error = %err, "companion view not opened");
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
