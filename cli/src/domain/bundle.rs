//! Bundle catalog types and pure name validation.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::InstallError;

/// File name of the persisted catalog inside the bundle root.
pub const CATALOG_FILE: &str = "additions_list.json";

/// Environment variable handed to spawned bundles with the bundle root path.
pub const ROOT_ENV_VAR: &str = "ADDITIONS_PATH";

/// Names become directory names under the bundle root, so anything that could
/// escape it (separators, drive colons, leading dot) is rejected. Spaces are
/// fine: `"Weather App"` is a valid bundle.
pub static BUNDLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern — cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r#"^[^./\\:*?"<>|\x00-\x1f][^/\\:*?"<>|\x00-\x1f]{0,127}$"#).expect("valid regex")
});

/// Validate a bundle name before it is used as a path component.
///
/// # Errors
///
/// Returns `InstallError::InvalidName` if the name is empty, too long, starts
/// with a dot, contains `..`, or contains path/reserved characters.
pub fn validate_bundle_name(name: &str) -> Result<(), InstallError> {
    if !BUNDLE_NAME_RE.is_match(name) || name.contains("..") || name.trim() != name {
        return Err(InstallError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Catalog value registered for a freshly installed bundle.
#[must_use]
pub fn catalog_path_for(name: &str) -> String {
    format!("{name}/")
}

/// One catalog entry: a bundle name and its directory relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRecord {
    pub name: String,
    pub relative_path: String,
}

impl BundleRecord {
    /// Absolute bundle directory under `root`.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path.trim_end_matches(['/', '\\']))
    }
}

/// Persisted mapping of bundle name → relative path (with trailing separator).
///
/// Serialized as a plain JSON object; a `BTreeMap` keeps the file diff-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, String>);

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<BundleRecord> {
        self.0.get(name).map(|path| BundleRecord {
            name: name.to_string(),
            relative_path: path.clone(),
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or replace; last writer wins.
    pub fn upsert(&mut self, name: &str, relative_path: &str) {
        self.0.insert(name.to_string(), relative_path.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in name order.
    pub fn records(&self) -> impl Iterator<Item = BundleRecord> + '_ {
        self.0.iter().map(|(name, path)| BundleRecord {
            name: name.clone(),
            relative_path: path.clone(),
        })
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encode bytes as lowercase hex string.
///
/// Used to log archive digests after download.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
