//! Lifecycle manager: activation per kind, stop/dismiss/reap, and listing.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use additions_cli::domain::{Activation, ActivationError, RunStatus, ViewTarget};

use crate::mocks::{CorruptCatalog, Fixture, MapManifests, ROOT, RecordingLauncher, RecordingOpener, settings};
use additions_cli::application::services::LifecycleManager;

const PYTHON: &str = r#"{"based_on": "python", "description": "Notes", "version": "1.2"}"#;
const EXE: &str = r#"{"based_on": "exe", "start": "bin/weather"}"#;
const HTML: &str = r#"{"based_on": "html", "start": "index.html"}"#;
const URL: &str = r#"{"based_on": "url", "start": "https://example.org/app"}"#;

fn bundle(name: &str) -> PathBuf {
    PathBuf::from(ROOT).join(name)
}

// ── start ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_python_spawns_interpreter_with_entry() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();

    let activation = manager.start("Notes").await.expect("starts");

    assert!(matches!(activation, Activation::Spawned { pid: Some(_) }));
    let spawned = fx.launcher.spawned();
    assert_eq!(spawned.len(), 1);
    let spec = &spawned[0];
    assert_eq!(spec.program, PathBuf::from("python3"));
    assert_eq!(spec.args, vec![bundle("Notes").join("app.py").display().to_string()]);
    assert_eq!(spec.working_dir, bundle("Notes"));
    assert!(spec.env.contains(&("ADDITIONS_PATH".to_string(), ROOT.to_string())));
    assert_eq!(spec.log_file, Some(PathBuf::from(ROOT).join(".logs/Notes.log")));
    assert_eq!(manager.status("Notes").await, RunStatus::Running);
}

#[tokio::test]
async fn test_start_executable_runs_entry_directly() {
    let fx = Fixture::new(&["Weather"]);
    fx.manifests.add("Weather", EXE);
    let manager = fx.manager();

    manager.start("Weather").await.expect("starts");

    let spec = &fx.launcher.spawned()[0];
    assert_eq!(spec.program, bundle("Weather").join("bin/weather"));
    assert!(spec.args.is_empty());
}

#[tokio::test]
async fn test_start_document_opens_view_without_process() {
    let fx = Fixture::new(&["Guide"]);
    fx.manifests.add("Guide", HTML);
    let manager = fx.manager();

    let activation = manager.start("Guide").await.expect("opens");

    let expected = bundle("Guide").join("index.html");
    assert_eq!(
        activation,
        Activation::Opened {
            target: expected.display().to_string()
        }
    );
    assert_eq!(fx.launcher.spawn_count(), 0);
    let opened = fx.opener.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].label, "Guide");
    assert_eq!(opened[0].target, ViewTarget::Document(expected));
    assert_eq!(manager.status("Guide").await, RunStatus::Running);
}

#[tokio::test]
async fn test_start_remote_opens_url() {
    let fx = Fixture::new(&["Portal"]);
    fx.manifests.add_without_entry("Portal", URL);
    let manager = fx.manager();

    let activation = manager.start("Portal").await.expect("opens");

    assert_eq!(
        activation,
        Activation::Opened {
            target: "https://example.org/app".to_string()
        }
    );
    assert_eq!(
        fx.opener.opened()[0].target,
        ViewTarget::Url("https://example.org/app".to_string())
    );
}

#[tokio::test]
async fn test_start_remote_without_url_is_missing_target() {
    let fx = Fixture::new(&["Portal"]);
    fx.manifests.add_without_entry("Portal", r#"{"based_on": "url"}"#);
    let manager = fx.manager();

    let err = manager.start("Portal").await.unwrap_err();

    assert!(matches!(err, ActivationError::MissingTarget(name) if name == "Portal"));
    assert_eq!(manager.status("Portal").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_start_process_opens_companion_link() {
    let fx = Fixture::new(&["Dash"]);
    fx.manifests.add(
        "Dash",
        r#"{"based_on": "python", "link": "http://127.0.0.1:8050/"}"#,
    );
    let manager = fx.manager();

    manager.start("Dash").await.expect("starts");

    let opened = fx.opener.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(
        opened[0].target,
        ViewTarget::Url("http://127.0.0.1:8050/".to_string())
    );
}

#[tokio::test]
async fn test_start_unknown_name_is_not_found() {
    let fx = Fixture::new(&[]);
    let manager = fx.manager();

    let err = manager.start("Ghost").await.unwrap_err();

    assert!(matches!(err, ActivationError::NotFound(_)));
    assert_eq!(err.to_string(), "Extension 'Ghost' not found.");
}

#[tokio::test]
async fn test_start_missing_entry_point_leaves_stopped() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add_without_entry("Notes", PYTHON);
    let manager = fx.manager();

    let err = manager.start("Notes").await.unwrap_err();

    assert!(matches!(err, ActivationError::EntryMissing(path) if path == bundle("Notes").join("app.py")));
    assert_eq!(fx.launcher.spawn_count(), 0);
    assert_eq!(manager.status("Notes").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_start_unrecognized_kind_is_unsupported() {
    let fx = Fixture::new(&["Odd"]);
    fx.manifests.add_without_entry("Odd", r#"{"based_on": "java"}"#);
    let manager = fx.manager();

    let err = manager.start("Odd").await.unwrap_err();

    assert!(matches!(err, ActivationError::UnsupportedKind { kind, .. } if kind == "java"));
}

#[tokio::test]
async fn test_start_with_missing_manifest_is_unsupported() {
    let fx = Fixture::new(&["Bare"]);
    let manager = fx.manager();

    let err = manager.start("Bare").await.unwrap_err();

    assert!(matches!(err, ActivationError::UnsupportedKind { kind, .. } if kind.is_empty()));
}

#[tokio::test]
async fn test_start_spawn_failure_leaves_stopped() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    fx.launcher.fail.store(true, Ordering::SeqCst);
    let manager = fx.manager();

    let err = manager.start("Notes").await.unwrap_err();

    assert!(matches!(err, ActivationError::SpawnFailed { .. }));
    assert_eq!(manager.status("Notes").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_start_view_failure_leaves_stopped() {
    let fx = Fixture::new(&["Guide"]);
    fx.manifests.add("Guide", HTML);
    fx.opener.fail.store(true, Ordering::SeqCst);
    let manager = fx.manager();

    let err = manager.start("Guide").await.unwrap_err();

    assert!(matches!(err, ActivationError::ViewFailed { .. }));
    assert_eq!(manager.status("Guide").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_start_twice_reuses_running_process() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();

    let first = manager.start("Notes").await.expect("starts");
    let second = manager.start("Notes").await.expect("still running");

    assert_eq!(fx.launcher.spawn_count(), 1);
    assert_eq!(second, Activation::AlreadyRunning { pid: first.pid() });
}

#[tokio::test]
async fn test_start_after_process_exited_spawns_again() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();

    manager.start("Notes").await.expect("starts");
    fx.launcher.exit_all();
    let again = manager.start("Notes").await.expect("restarts");

    assert!(matches!(again, Activation::Spawned { .. }));
    assert_eq!(fx.launcher.spawn_count(), 2);
}

#[tokio::test]
async fn test_concurrent_starts_spawn_once() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();

    let (a, b) = tokio::join!(manager.start("Notes"), manager.start("Notes"));

    a.expect("first start");
    b.expect("second start");
    assert_eq!(fx.launcher.spawn_count(), 1);
}

// ── stop / dismiss / reap ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_stop_terminates_child() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();
    manager.start("Notes").await.expect("starts");

    assert!(manager.stop("Notes").await);

    assert_eq!(fx.launcher.terminate_count(), 1);
    assert_eq!(manager.status("Notes").await, RunStatus::Stopped);
    assert!(!manager.stop("Notes").await, "second stop has nothing to do");
}

#[tokio::test]
async fn test_stop_never_started_is_false() {
    let fx = Fixture::new(&["Notes"]);
    let manager = fx.manager();

    assert!(!manager.stop("Notes").await);
    assert!(!manager.stop("Ghost").await);
}

#[tokio::test]
async fn test_stop_document_is_false_and_dismiss_clears_it() {
    let fx = Fixture::new(&["Guide"]);
    fx.manifests.add("Guide", HTML);
    let manager = fx.manager();
    manager.start("Guide").await.expect("opens");

    assert!(!manager.stop("Guide").await);
    assert_eq!(manager.status("Guide").await, RunStatus::Running);

    assert!(manager.dismiss("Guide").await);
    assert_eq!(manager.status("Guide").await, RunStatus::Stopped);
    assert!(!manager.dismiss("Guide").await);
}

#[tokio::test]
async fn test_dismiss_refuses_process_bundle() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();
    manager.start("Notes").await.expect("starts");

    assert!(!manager.dismiss("Notes").await);
    assert_eq!(manager.status("Notes").await, RunStatus::Running);
}

#[tokio::test]
async fn test_reap_clears_exited_process() {
    let fx = Fixture::new(&["Notes"]);
    fx.manifests.add("Notes", PYTHON);
    let manager = fx.manager();
    manager.start("Notes").await.expect("starts");

    assert!(!manager.reap("Notes").await, "live process is not reaped");
    fx.launcher.exit_all();
    assert!(manager.reap("Notes").await);
    assert_eq!(manager.status("Notes").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_shutdown_stops_only_processes() {
    let fx = Fixture::new(&["Notes", "Weather", "Guide"]);
    fx.manifests.add("Notes", PYTHON).add("Weather", EXE).add("Guide", HTML);
    let manager = fx.manager();
    for name in ["Notes", "Weather", "Guide"] {
        manager.start(name).await.expect("starts");
    }

    assert_eq!(manager.shutdown().await, 2);
    assert_eq!(fx.launcher.terminate_count(), 2);
}

// ── list / info ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_is_sorted_and_reports_status() {
    let fx = Fixture::new(&["Weather", "Notes"]);
    fx.manifests.add("Notes", PYTHON).add("Weather", EXE);
    let manager = fx.manager();
    manager.start("Weather").await.expect("starts");

    let list = manager.list().await;

    let names: Vec<_> = list.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Notes", "Weather"]);
    assert!(!list[0].running);
    assert!(list[1].running);
    assert_eq!(list[0].description, "Notes");
    assert_eq!(list[0].version, "1.2");
    assert_eq!(list[0].based_on, "python");
    assert_eq!(list[0].path, "Notes/");
}

#[tokio::test]
async fn test_list_degrades_broken_manifests_individually() {
    let fx = Fixture::new(&["Bare", "Broken", "Notes"]);
    fx.manifests.add("Notes", PYTHON).add_invalid("Broken");
    let manager = fx.manager();

    let list = manager.list().await;

    assert_eq!(list.len(), 3);
    assert_eq!(list[0].degraded.as_deref(), Some("manifest not found"));
    assert_eq!(list[0].description, "No description");
    assert_eq!(list[0].version, "unknown");
    assert!(
        list[1]
            .degraded
            .as_deref()
            .is_some_and(|d| d.starts_with("invalid manifest"))
    );
    assert_eq!(list[2].degraded, None);
}

#[tokio::test]
async fn test_list_picks_up_catalog_changes() {
    let fx = Fixture::new(&["Notes"]);
    let manager = fx.manager();
    fx.catalog.insert_raw("Later", "Later/");

    let names: Vec<_> = manager.list().await.into_iter().map(|e| e.name).collect();

    assert_eq!(names, vec!["Later", "Notes"]);
}

#[tokio::test]
async fn test_info_unknown_is_none() {
    let fx = Fixture::new(&["Notes"]);
    let manager = fx.manager();

    assert!(manager.info("Ghost").await.is_none());
    assert_eq!(manager.info("Notes").await.map(|i| i.name), Some("Notes".to_string()));
}

#[tokio::test]
async fn test_corrupt_catalog_lists_nothing() {
    let manager = LifecycleManager::new(
        CorruptCatalog,
        MapManifests::default(),
        RecordingLauncher::default(),
        RecordingOpener::default(),
        settings(),
    );

    assert!(manager.list().await.is_empty());
    assert!(matches!(
        manager.start("Notes").await,
        Err(ActivationError::NotFound(_))
    ));
}
