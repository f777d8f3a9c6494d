//! Domain types and validators for host configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use additions_common::RemoteEntry;
use additions_common::config::default_listen_addr;
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &["root", "listen", "python", "stop_grace_ms"];

/// Upper bound for the graceful-stop window.
pub const MAX_STOP_GRACE_MS: u64 = 60_000;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.additions/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Bundle root. `None` means the platform default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Loopback endpoint address.
    pub listen: SocketAddr,
    /// Interpreter for `python` bundles.
    pub python: String,
    /// Graceful termination window before a child is killed.
    pub stop_grace_ms: u64,
    /// Bundles offered for installation.
    pub remote: BTreeMap<String, RemoteEntry>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: None,
            listen: default_listen_addr(),
            python: "python".to_string(),
            stop_grace_ms: 1000,
            remote: BTreeMap::new(),
        }
    }
}

impl HostConfig {
    #[must_use]
    pub fn stop_grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stop_grace_ms)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |hint: &str| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            hint: hint.to_string(),
        }
        .into()
    };
    match key {
        "root" | "python" if value.trim().is_empty() => Err(invalid("Value must not be empty")),
        "listen" => match value.parse::<SocketAddr>() {
            Ok(addr) if addr.ip().is_loopback() => Ok(()),
            Ok(_) => Err(invalid("Address must be a loopback address, e.g. 127.0.0.1:5000")),
            Err(_) => Err(invalid("Expected host:port, e.g. 127.0.0.1:5000")),
        },
        "stop_grace_ms" => match value.parse::<u64>() {
            Ok(ms) if ms <= MAX_STOP_GRACE_MS => Ok(()),
            _ => Err(invalid(&format!(
                "Expected milliseconds between 0 and {MAX_STOP_GRACE_MS}"
            ))),
        },
        _ => Ok(()),
    }
}

/// Apply a validated key/value pair to `config`.
///
/// # Errors
///
/// Returns an error if the key or value fails validation.
pub fn apply_config_value(config: &mut HostConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "root" => config.root = Some(PathBuf::from(value)),
        "listen" => config.listen = value.parse()?,
        "python" => config.python = value.to_string(),
        "stop_grace_ms" => config.stop_grace_ms = value.parse()?,
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
