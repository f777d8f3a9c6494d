//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Catalog errors ────────────────────────────────────────────────────────────

/// Errors reading or writing the persisted catalog.
///
/// An absent catalog is not an error (first run); only a catalog that exists
/// but cannot be read or parsed ends up here.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("cannot access catalog {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },
}

// ── Manifest errors ───────────────────────────────────────────────────────────

/// Per-bundle manifest failures. Both variants leave the bundle listed but degraded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("manifest not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid manifest {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

// ── Install / remove errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid extension name '{0}': must not be empty, start with '.', or contain path separators")]
    InvalidName(String),

    #[error("Download failed: {0}")]
    FetchFailed(String),

    #[error("Extraction failed: {0}")]
    ExtractFailed(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum RemoveError {
    #[error("Extension '{0}' not found.")]
    NotFound(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ── Activation errors ─────────────────────────────────────────────────────────

/// Why `start` left a bundle `Stopped`.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Extension '{0}' not found.")]
    NotFound(String),

    #[error("Entry point not found: {}", .0.display())]
    EntryMissing(PathBuf),

    #[error("Extension '{0}' has no URL to open.")]
    MissingTarget(String),

    #[error("Unsupported extension type '{kind}' for '{name}'.")]
    UnsupportedKind { name: String, kind: String },

    #[error("Failed to launch '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    #[error("Failed to open view for '{name}': {reason}")]
    ViewFailed { name: String, reason: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\n{hint}")]
    InvalidValue {
        key: String,
        value: String,
        hint: String,
    },
}
