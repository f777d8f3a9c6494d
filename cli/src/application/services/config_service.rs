//! Application service — configuration use-cases.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{HostConfig, apply_config_value};

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<HostConfig> {
    store.load()
}

/// Validate and persist one setting, returning the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the file cannot be written.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<HostConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::info!(key, value, "configuration updated");
    Ok(config)
}

/// Bundle root: `ADDITIONS_PATH` when set, then the configured root, then `default`.
#[must_use]
pub fn resolve_root(config: &HostConfig, env_root: Option<PathBuf>, default: PathBuf) -> PathBuf {
    env_root
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| config.root.clone())
        .unwrap_or(default)
}
