//! Bundle installer: download, replace, register, and removal.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use additions_cli::application::ports::{CatalogStore, LocalFs};
use additions_cli::application::services::BundleInstaller;
use additions_cli::domain::{InstallError, RemoveError};

use crate::mocks::{CannedFetcher, MemExtractor, MemFs, MemoryCatalog, ROOT, RecordingReporter};

const ARCHIVE: &[u8] = br#"{"based_on": "python"}"#;

fn installer(fetcher: CannedFetcher, fs: &MemFs) -> (BundleInstaller<CannedFetcher, MemExtractor, MemFs>, MemExtractor) {
    let extractor = MemExtractor::new(fs);
    let installer = BundleInstaller::new(fetcher, extractor.clone(), fs.clone(), PathBuf::from(ROOT));
    (installer, extractor)
}

fn dir(name: &str) -> PathBuf {
    Path::new(ROOT).join(name)
}

#[tokio::test]
async fn test_install_registers_bundle() {
    let fs = MemFs::default();
    let fetcher = CannedFetcher::serving(ARCHIVE);
    let (installer, _) = installer(fetcher.clone(), &fs);
    let catalog = MemoryCatalog::default();
    let reporter = RecordingReporter::default();

    installer
        .install(&catalog, "Notes", "https://example.org/notes.zip", &reporter)
        .await
        .expect("installs");

    assert_eq!(fetcher.urls(), vec!["https://example.org/notes.zip"]);
    assert_eq!(
        catalog.snapshot().get("Notes").map(|r| r.relative_path),
        Some("Notes/".to_string())
    );
    assert!(fs.file(&dir("Notes").join("rules.json")).is_some());
    assert_eq!(
        reporter.events(),
        vec![
            "step: downloading Notes...",
            "step: extracting Notes...",
            "ok: Notes installed",
        ]
    );
}

#[tokio::test]
async fn test_install_replaces_previous_contents() {
    let fs = MemFs::default();
    fs.write(&dir("Notes").join("stale.txt"), "old");
    let (installer, _) = installer(CannedFetcher::serving(ARCHIVE), &fs);
    let catalog = MemoryCatalog::with(&["Notes"]);

    installer
        .install(&catalog, "Notes", "https://example.org/v2.zip", &RecordingReporter::default())
        .await
        .expect("reinstalls");

    assert!(fs.file(&dir("Notes").join("stale.txt")).is_none());
    assert!(fs.file(&dir("Notes").join("rules.json")).is_some());
    assert_eq!(catalog.snapshot().len(), 1);
}

#[tokio::test]
async fn test_install_fetch_failure_keeps_existing_install() {
    let fs = MemFs::default();
    fs.write(&dir("Notes").join("rules.json"), "{}");
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::with(&["Notes"]);

    let err = installer
        .install(&catalog, "Notes", "https://example.org/gone.zip", &RecordingReporter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::FetchFailed(msg) if msg.contains("404")));
    assert_eq!(fs.file(&dir("Notes").join("rules.json")).as_deref(), Some("{}"));
    assert!(catalog.snapshot().contains("Notes"));
}

#[tokio::test]
async fn test_install_extract_failure_drops_catalog_entry() {
    let fs = MemFs::default();
    let (installer, extractor) = installer(CannedFetcher::serving(b"garbage"), &fs);
    extractor.fail.store(true, Ordering::SeqCst);
    let catalog = MemoryCatalog::with(&["Notes"]);

    let err = installer
        .install(&catalog, "Notes", "https://example.org/bad.bin", &RecordingReporter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, InstallError::ExtractFailed(_)));
    assert!(!catalog.snapshot().contains("Notes"));
}

#[tokio::test]
async fn test_install_rejects_path_like_names() {
    let fs = MemFs::default();
    let fetcher = CannedFetcher::serving(ARCHIVE);
    let (installer, _) = installer(fetcher.clone(), &fs);
    let catalog = MemoryCatalog::default();

    for name in ["", "..", "../escape", "a/b", ".hidden", "C:evil"] {
        let err = installer
            .install(&catalog, name, "https://example.org/x.zip", &RecordingReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::InvalidName(_)), "accepted {name:?}");
    }
    assert!(fetcher.urls().is_empty(), "nothing is downloaded for bad names");
    assert!(catalog.snapshot().is_empty());
}

#[tokio::test]
async fn test_install_different_names_concurrently() {
    let fs = MemFs::default();
    let (installer, _) = installer(CannedFetcher::serving(ARCHIVE), &fs);
    let catalog = MemoryCatalog::default();
    let reporter = RecordingReporter::default();

    let (a, b) = tokio::join!(
        installer.install(&catalog, "Notes", "https://example.org/a.zip", &reporter),
        installer.install(&catalog, "Weather App", "https://example.org/b.zip", &reporter),
    );

    a.expect("first");
    b.expect("second");
    assert_eq!(catalog.snapshot().len(), 2);
}

#[tokio::test]
async fn test_remove_deletes_directory_and_entry() {
    let fs = MemFs::default();
    fs.write(&dir("Notes").join("rules.json"), "{}");
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::with(&["Notes", "Weather"]);

    installer.remove(&catalog, "Notes").await.expect("removes");

    assert!(!fs.exists(&dir("Notes")));
    assert!(!catalog.snapshot().contains("Notes"));
    assert!(catalog.snapshot().contains("Weather"));
}

#[tokio::test]
async fn test_remove_missing_directory_still_drops_entry() {
    let fs = MemFs::default();
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::with(&["Notes"]);

    installer.remove(&catalog, "Notes").await.expect("removes");

    assert!(catalog.snapshot().is_empty());
}

#[tokio::test]
async fn test_remove_unknown_is_not_found_and_touches_nothing() {
    let fs = MemFs::default();
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::with(&["Notes"]);

    let err = installer.remove(&catalog, "Ghost").await.unwrap_err();

    assert!(matches!(err, RemoveError::NotFound(_)));
    assert_eq!(err.to_string(), "Extension 'Ghost' not found.");
    assert_eq!(catalog.save_count(), 0);
}

#[tokio::test]
async fn test_remove_drops_entry_but_keeps_files_outside_root() {
    let fs = MemFs::default();
    fs.write(&Path::new("/srv").join("keep.txt"), "precious");
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::default();
    catalog.insert_raw("Sneaky", "../");
    catalog.insert_raw("Empty", "");

    for name in ["Sneaky", "Empty"] {
        installer.remove(&catalog, name).await.expect("entry is dropped");
    }

    assert!(catalog.load().unwrap().is_empty());
    assert_eq!(
        fs.file(&Path::new("/srv").join("keep.txt")).as_deref(),
        Some("precious")
    );
}

#[tokio::test]
async fn test_remove_releases_only_known_bundles() {
    let fs = MemFs::default();
    let (installer, _) = installer(CannedFetcher::unreachable(), &fs);
    let catalog = MemoryCatalog::with(&["Notes"]);
    let released = AtomicUsize::new(0);
    let counter = &released;
    let release = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
    };

    installer
        .remove_with(&catalog, "Ghost", release())
        .await
        .unwrap_err();
    assert_eq!(released.load(Ordering::SeqCst), 0);

    installer
        .remove_with(&catalog, "Notes", release())
        .await
        .expect("removes");
    assert_eq!(released.load(Ordering::SeqCst), 1);

    catalog.insert_raw("Weather", "Weather/");
    catalog.corrupt();
    let err = installer
        .remove_with(&catalog, "Weather", release())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoveError::Catalog(_)));
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_install_releases_after_download_only() {
    let fs = MemFs::default();
    let catalog = MemoryCatalog::default();
    let released = AtomicUsize::new(0);
    let counter = &released;
    let release = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
    };

    let (offline, _) = installer(CannedFetcher::unreachable(), &fs);
    offline
        .install_with(
            &catalog,
            "Notes",
            "https://example.org/x.zip",
            &RecordingReporter::default(),
            release(),
        )
        .await
        .unwrap_err();
    assert_eq!(released.load(Ordering::SeqCst), 0);

    let (online, _) = installer(CannedFetcher::serving(ARCHIVE), &fs);
    online
        .install_with(
            &catalog,
            "Notes",
            "https://example.org/x.zip",
            &RecordingReporter::default(),
            release(),
        )
        .await
        .expect("installs");
    assert_eq!(released.load(Ordering::SeqCst), 1);
}
