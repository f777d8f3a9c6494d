//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::domain::{Catalog, CatalogError, HostConfig, LoadError, Manifest, ViewRequest};

// ── Catalog Port ──────────────────────────────────────────────────────────────

/// Persisted catalog of installed bundles.
///
/// `upsert` and `remove` are last-writer-wins read-modify-write helpers.
/// Implementations that can be shared between threads must serialize them
/// so two writers for different names do not drop each other's entry.
pub trait CatalogStore {
    /// Load the catalog. A catalog that does not exist yet is empty, not an error.
    fn load(&self) -> Result<Catalog, CatalogError>;
    /// Replace the persisted catalog. Readers never observe a partial write.
    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError>;

    /// Insert or replace one entry.
    fn upsert(&self, name: &str, relative_path: &str) -> Result<(), CatalogError> {
        let mut catalog = self.load()?;
        catalog.upsert(name, relative_path);
        self.save(&catalog)
    }

    /// Remove one entry, returning its previous path. Absent names leave the
    /// file untouched.
    fn remove(&self, name: &str) -> Result<Option<String>, CatalogError> {
        let mut catalog = self.load()?;
        let removed = catalog.remove(name);
        if removed.is_some() {
            self.save(&catalog)?;
        }
        Ok(removed)
    }
}

// ── Manifest Port ─────────────────────────────────────────────────────────────

/// Reads bundle descriptors and checks entry points inside bundle directories.
pub trait ManifestSource {
    /// Load the manifest from `bundle_dir`.
    ///
    /// # Errors
    ///
    /// `LoadError::NotFound` when the file is missing, `LoadError::Invalid`
    /// when it cannot be read or parsed.
    fn load(&self, bundle_dir: &Path) -> Result<Manifest, LoadError>;
    /// Whether an entry point exists on disk.
    fn entry_exists(&self, path: &Path) -> bool;
}

// ── Install Ports ─────────────────────────────────────────────────────────────

/// Downloads a packaged bundle.
#[allow(async_fn_in_trait)]
pub trait ArchiveFetcher {
    /// Fetch the archive bytes at `url`. Network and HTTP-status failures are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Unpacks a downloaded archive into a bundle directory.
#[allow(async_fn_in_trait)]
pub trait ArchiveExtractor {
    /// Extract `archive` into `dest`, which already exists and is empty.
    async fn extract(&self, archive: Vec<u8>, dest: &Path) -> Result<()>;
}

/// Abstracts the raw filesystem operations the installer and log reader need.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

// ── Process Ports ─────────────────────────────────────────────────────────────

/// Everything needed to spawn one bundle process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Bundle name, used for logging.
    pub name: String,
    /// Interpreter or executable path.
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Working directory; the bundle directory.
    pub working_dir: PathBuf,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,
    /// Where stdout/stderr are appended. `None` discards output.
    pub log_file: Option<PathBuf>,
}

/// A spawned child owned by the supervisor.
#[allow(async_fn_in_trait)]
pub trait SupervisedChild: Send {
    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;
    /// Non-blocking check whether the process already exited.
    fn has_exited(&mut self) -> bool;
    /// Ask the process to exit, wait up to `grace`, then kill it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could neither be signalled nor killed.
    async fn terminate(&mut self, grace: Duration) -> Result<()>;
}

/// Spawns bundle processes.
pub trait ProcessLauncher {
    type Child: SupervisedChild;

    /// Spawn a process described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn spawn(&self, spec: &LaunchSpec) -> Result<Self::Child>;
}

// ── Presentation Port ─────────────────────────────────────────────────────────

/// Signals the presentation layer to open a tab. Must not block.
pub trait ViewOpener {
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    fn open(&self, request: &ViewRequest) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts host configuration persistence.
pub trait ConfigStore {
    /// Load configuration, returning defaults when no file exists.
    fn load(&self) -> Result<HostConfig>;
    /// Persist configuration.
    fn save(&self, config: &HostConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts short-lived helper process execution so infrastructure can be
/// swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output with the default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<std::process::Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<std::process::Output>;
}
