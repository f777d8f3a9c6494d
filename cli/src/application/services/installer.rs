//! Application service — bundle install and removal use-cases.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::future;
use std::path::{Component, Path, PathBuf};

use crate::application::ports::{
    ArchiveExtractor, ArchiveFetcher, CatalogStore, LocalFs, ProgressReporter,
};
use crate::application::services::keyed_lock::KeyedLocks;
use crate::domain::bundle::catalog_path_for;
use crate::domain::{InstallError, RemoveError, validate_bundle_name};

/// Fetches, unpacks, and registers bundles under one root.
///
/// Operations on the same name are serialized; different names proceed
/// concurrently. The catalog store serializes its own writes.
pub struct BundleInstaller<N, X, F> {
    fetcher: N,
    extractor: X,
    fs: F,
    root: PathBuf,
    locks: KeyedLocks,
}

impl<N, X, F> BundleInstaller<N, X, F>
where
    N: ArchiveFetcher,
    X: ArchiveExtractor,
    F: LocalFs,
{
    pub fn new(fetcher: N, extractor: X, fs: F, root: PathBuf) -> Self {
        Self {
            fetcher,
            extractor,
            fs,
            root,
            locks: KeyedLocks::new(),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Download `url`, replace `<root>/<name>/` with its contents, and
    /// register `name` in the catalog.
    ///
    /// A failed download leaves any previous installation untouched. Once the
    /// old directory has been replaced, a failed extraction also drops the
    /// catalog entry so it never points at a half-written bundle.
    ///
    /// # Errors
    ///
    /// See [`InstallError`].
    pub async fn install(
        &self,
        catalog: &impl CatalogStore,
        name: &str,
        url: &str,
        reporter: &impl ProgressReporter,
    ) -> Result<(), InstallError> {
        self.install_with(catalog, name, url, reporter, future::ready(()))
            .await
    }

    /// [`Self::install`], awaiting `release` once the download succeeded and
    /// before the old directory is touched.
    ///
    /// # Errors
    ///
    /// See [`InstallError`].
    pub async fn install_with(
        &self,
        catalog: &impl CatalogStore,
        name: &str,
        url: &str,
        reporter: &impl ProgressReporter,
        release: impl Future<Output = ()>,
    ) -> Result<(), InstallError> {
        validate_bundle_name(name)?;
        let _guard = self.locks.lock(name).await;

        reporter.step(&format!("downloading {name}..."));
        let archive = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| InstallError::FetchFailed(format!("{e:#}")))?;
        tracing::debug!(bundle = name, bytes = archive.len(), "archive downloaded");

        release.await;
        let dest = self.root.join(name);
        if self.fs.exists(&dest) {
            self.fs
                .remove_dir_all(&dest)
                .map_err(|e| InstallError::Filesystem(format!("{e:#}")))?;
        }
        self.fs
            .create_dir_all(&dest)
            .map_err(|e| InstallError::Filesystem(format!("{e:#}")))?;

        reporter.step(&format!("extracting {name}..."));
        if let Err(e) = self.extractor.extract(archive, &dest).await {
            if let Err(catalog_err) = catalog.remove(name) {
                tracing::warn!(bundle = name, error = %catalog_err, "stale catalog entry kept");
            }
            return Err(InstallError::ExtractFailed(format!("{e:#}")));
        }

        catalog.upsert(name, &catalog_path_for(name))?;
        reporter.success(&format!("{name} installed"));
        tracing::info!(bundle = name, url, "installed");
        Ok(())
    }

    /// Delete the bundle directory (if present) and its catalog entry.
    ///
    /// # Errors
    ///
    /// `RemoveError::NotFound` when `name` is not in the catalog; nothing is
    /// touched in that case.
    pub async fn remove(&self, catalog: &impl CatalogStore, name: &str) -> Result<(), RemoveError> {
        self.remove_with(catalog, name, future::ready(())).await
    }

    /// [`Self::remove`], awaiting `release` once `name` is known to be in the
    /// catalog and before anything is deleted.
    ///
    /// An entry whose path points outside the root keeps its directory on disk
    /// but still leaves the catalog.
    ///
    /// # Errors
    ///
    /// `RemoveError::NotFound` when `name` is not in the catalog and
    /// `RemoveError::Catalog` when the catalog cannot be read; `release` is
    /// not awaited in either case.
    pub async fn remove_with(
        &self,
        catalog: &impl CatalogStore,
        name: &str,
        release: impl Future<Output = ()>,
    ) -> Result<(), RemoveError> {
        let _guard = self.locks.lock(name).await;

        let Some(record) = catalog.load()?.get(name) else {
            return Err(RemoveError::NotFound(name.to_string()));
        };
        release.await;

        let dir = record.resolve(&self.root);
        if !stays_under_root(Path::new(&record.relative_path)) {
            tracing::warn!(
                bundle = name,
                path = %dir.display(),
                "not deleting a directory outside the extensions root"
            );
        } else if self.fs.exists(&dir) {
            self.fs
                .remove_dir_all(&dir)
                .map_err(|e| RemoveError::Filesystem(format!("{e:#}")))?;
        }
        catalog.remove(name)?;
        tracing::info!(bundle = name, "removed");
        Ok(())
    }
}

fn stays_under_root(relative: &Path) -> bool {
    relative.components().next().is_some()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
