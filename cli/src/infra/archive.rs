//! Infrastructure implementation of the `ArchiveExtractor` port.
//!
//! Zip and gzip-compressed tar archives are told apart by their leading magic
//! bytes, not by URL suffix. Entries are unpacked under the destination only;
//! an absolute path or `..` component aborts the whole extraction.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::application::ports::ArchiveExtractor;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    TarGz,
}

fn detect_archive_kind(data: &[u8]) -> Option<ArchiveKind> {
    if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
        Some(ArchiveKind::Zip)
    } else if data.starts_with(GZIP_MAGIC) {
        Some(ArchiveKind::TarGz)
    } else {
        None
    }
}

/// Unpacks downloaded bundles on the blocking thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveUnpacker;

impl ArchiveExtractor for ArchiveUnpacker {
    async fn extract(&self, archive: Vec<u8>, dest: &Path) -> Result<()> {
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || extract_archive(&archive, &dest))
            .await
            .context("extraction task failed")?
    }
}

/// Extract `data` into `dest_dir`, choosing the format from its magic bytes.
///
/// # Errors
///
/// Returns an error for unrecognized formats, corrupt archives, entries that
/// escape `dest_dir`, or filesystem failures.
pub fn extract_archive(data: &[u8], dest_dir: &Path) -> Result<()> {
    match detect_archive_kind(data) {
        Some(ArchiveKind::Zip) => extract_zip_archive(data, dest_dir),
        Some(ArchiveKind::TarGz) => extract_tar_gz_archive(data, dest_dir),
        None => anyhow::bail!("unsupported archive format (expected zip or tar.gz)"),
    }
}

fn sanitize_archive_path(path: &Path) -> Result<PathBuf> {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::ParentDir => {
                anyhow::bail!("archive entry escapes destination: {}", path.display());
            }
            Component::CurDir => {}
            Component::Normal(part) => cleaned.push(part),
        }
    }
    Ok(cleaned)
}

fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("create {}", path.display()))
}

fn extract_zip_archive(data: &[u8], dest_dir: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(data)).context("read zip archive")?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("read zip entry")?;
        let raw = entry.name().replace('\\', "/");
        let rel = sanitize_archive_path(Path::new(&raw))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let out = dest_dir.join(&rel);
        if entry.is_dir() {
            ensure_dir(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            ensure_dir(parent)?;
        }
        let mut out_file =
            File::create(&out).with_context(|| format!("create {}", out.display()))?;
        io::copy(&mut entry, &mut out_file)
            .with_context(|| format!("extract {}", out.display()))?;

        // Executable bundles ship their binary with the exec bit set.
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode & 0o755))
                .with_context(|| format!("set permissions on {}", out.display()))?;
        }
    }
    Ok(())
}

fn extract_tar_gz_archive(data: &[u8], dest_dir: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    for entry in archive.entries().context("read tar entries")? {
        let mut entry = entry.context("read tar entry")?;
        let raw_path = entry.path().context("read tar path")?.to_path_buf();
        let rel = sanitize_archive_path(&raw_path)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let out = dest_dir.join(&rel);
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            ensure_dir(&out)?;
        } else if entry_type.is_symlink() || entry_type.is_hard_link() {
            tracing::warn!(entry = %raw_path.display(), "skipping link entry");
        } else {
            if let Some(parent) = out.parent() {
                ensure_dir(parent)?;
            }
            entry
                .unpack(&out)
                .with_context(|| format!("extract {}", out.display()))?;
        }
    }
    Ok(())
}
