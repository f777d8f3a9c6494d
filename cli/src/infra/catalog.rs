//! Infrastructure implementation of the `CatalogStore` port.
//!
//! The catalog is a pretty-printed JSON object in `<root>/additions_list.json`.
//! Saves go through a temp file in the same directory followed by a rename,
//! so readers see either the old or the new catalog, never a partial one.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::application::ports::CatalogStore;
use crate::domain::bundle::CATALOG_FILE;
use crate::domain::{Catalog, CatalogError};

/// JSON file catalog. Read-modify-write helpers are serialized in-process.
#[derive(Debug)]
pub struct JsonCatalogStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCatalogStore {
    /// Catalog stored in the standard file under `root`.
    #[must_use]
    pub fn in_root(root: &Path) -> Self {
        Self::with_path(root.join(CATALOG_FILE))
    }

    /// Catalog at an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: &impl std::fmt::Display) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Catalog::new()),
            Err(e) => return Err(self.io_error(&e)),
        };
        if content.trim().is_empty() {
            return Ok(Catalog::new());
        }
        serde_json::from_str(&content).map_err(|e| CatalogError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| self.io_error(&e))?;

        let mut content = serde_json::to_string_pretty(catalog).map_err(|e| self.io_error(&e))?;
        content.push('\n');

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.io_error(&e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| self.io_error(&e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(&e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(&e.error))?;
        tracing::debug!(path = %self.path.display(), entries = catalog.len(), "catalog saved");
        Ok(())
    }

    fn upsert(&self, name: &str, relative_path: &str) -> Result<(), CatalogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut catalog = self.load()?;
        catalog.upsert(name, relative_path);
        self.save(&catalog)
    }

    fn remove(&self, name: &str) -> Result<Option<String>, CatalogError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut catalog = self.load()?;
        let removed = catalog.remove(name);
        if removed.is_some() {
            self.save(&catalog)?;
        }
        Ok(removed)
    }
}
