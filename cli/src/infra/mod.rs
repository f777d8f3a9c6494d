//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: catalog and config files,
//! manifest reading, archive download and extraction, process supervision,
//! and view opening.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod catalog;
pub mod command_runner;
pub mod config;
pub mod fetch;
pub mod fs;
pub mod manifest;
pub mod process;
pub mod views;

use std::path::PathBuf;

use crate::application::ports::ViewOpener;
use crate::application::services::{
    BundleInstaller, ExtensionHost, LifecycleManager, ManagerSettings,
};
use crate::domain::HostConfig;

use self::archive::ArchiveUnpacker;
use self::catalog::JsonCatalogStore;
use self::command_runner::TokioCommandRunner;
use self::fetch::UreqFetcher;
use self::fs::StdFs;
use self::manifest::FsManifestLoader;
use self::process::TokioLauncher;

/// The extension host wired to the local filesystem and network.
pub type LocalHost<V> = ExtensionHost<
    JsonCatalogStore,
    FsManifestLoader,
    TokioLauncher,
    V,
    UreqFetcher,
    ArchiveUnpacker,
    StdFs,
>;

/// Assemble a host for `root`, delivering view requests to `views`.
pub fn build_host<V: ViewOpener>(root: PathBuf, config: &HostConfig, views: V) -> LocalHost<V> {
    let manager = LifecycleManager::new(
        JsonCatalogStore::in_root(&root),
        FsManifestLoader,
        TokioLauncher::new(TokioCommandRunner::default()),
        views,
        ManagerSettings::from_config(root.clone(), config),
    );
    let installer = BundleInstaller::new(UreqFetcher::new(), ArchiveUnpacker, StdFs, root);
    ExtensionHost::new(manager, installer, config.remote.clone())
}
