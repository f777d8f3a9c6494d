//! Infrastructure implementation of the `ManifestSource` port.

use std::path::Path;

use crate::application::ports::ManifestSource;
use crate::domain::manifest::MANIFEST_FILE;
use crate::domain::{LoadError, Manifest};

/// Reads `rules.json` from bundle directories on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsManifestLoader;

impl ManifestSource for FsManifestLoader {
    fn load(&self, bundle_dir: &Path) -> Result<Manifest, LoadError> {
        let path = bundle_dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(path));
            }
            Err(e) => {
                return Err(LoadError::Invalid {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        Manifest::parse(&content).map_err(|e| LoadError::Invalid {
            path,
            reason: e.to_string(),
        })
    }

    fn entry_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
