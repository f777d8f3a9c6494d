//! Real child processes through the tokio launcher and on-disk catalog.
//!
//! The interpreter is `sh`, so the bundle scripts never need an exec bit.

#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use additions_cli::application::ports::CatalogStore;
use additions_cli::application::services::{LifecycleManager, ManagerSettings};
use additions_cli::domain::{Activation, RunStatus};
use additions_cli::infra::catalog::JsonCatalogStore;
use additions_cli::infra::command_runner::TokioCommandRunner;
use additions_cli::infra::manifest::FsManifestLoader;
use additions_cli::infra::process::TokioLauncher;
use tempfile::TempDir;

use crate::mocks::RecordingOpener;

type RealManager = LifecycleManager<JsonCatalogStore, FsManifestLoader, TokioLauncher, RecordingOpener>;

fn install_script(root: &Path, name: &str, script: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("rules.json"), r#"{"based_on": "python", "start": "run.sh"}"#).unwrap();
    std::fs::write(dir.join("run.sh"), script).unwrap();
    JsonCatalogStore::in_root(root)
        .upsert(name, &format!("{name}/"))
        .unwrap();
}

fn manager(root: &Path) -> RealManager {
    LifecycleManager::new(
        JsonCatalogStore::in_root(root),
        FsManifestLoader,
        TokioLauncher::new(TokioCommandRunner::default()),
        RecordingOpener::default(),
        ManagerSettings {
            root: root.to_path_buf(),
            python: "sh".to_string(),
            stop_grace: Duration::from_secs(2),
            log_dir: Some(root.join(".logs")),
        },
    )
}

async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_process_runs_with_root_env_and_stops() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    install_script(
        root,
        "Sleeper",
        "echo \"root=$ADDITIONS_PATH\"\nexec sleep 30\n",
    );
    let manager = manager(root);

    let activation = manager.start("Sleeper").await.expect("spawns");
    assert!(matches!(activation, Activation::Spawned { pid: Some(_) }));
    assert_eq!(manager.status("Sleeper").await, RunStatus::Running);

    let log = root.join(".logs/Sleeper.log");
    let expected = format!("root={}", std::path::absolute(root).unwrap().display());
    assert!(
        wait_for(|| std::fs::read_to_string(&log).is_ok_and(|l| l.contains(&expected))).await,
        "child output not captured"
    );

    assert!(manager.stop("Sleeper").await);
    assert_eq!(manager.status("Sleeper").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_process_ignoring_term_is_killed_after_grace() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    install_script(root, "Stubborn", "trap '' TERM\nwhile true; do sleep 1; done\n");
    let manager = manager(root);

    manager.start("Stubborn").await.expect("spawns");
    let stopped = tokio::time::timeout(Duration::from_secs(10), manager.stop("Stubborn")).await;

    assert_eq!(stopped.ok(), Some(true));
    assert_eq!(manager.status("Stubborn").await, RunStatus::Stopped);
}

#[tokio::test]
async fn test_process_exiting_on_its_own_is_reaped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    install_script(root, "Oneshot", "echo done\n");
    let manager = manager(root);

    manager.start("Oneshot").await.expect("spawns");

    let mut reaped = false;
    for _ in 0..100 {
        if manager.reap("Oneshot").await {
            reaped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(reaped, "exited process was never reaped");
    assert_eq!(manager.status("Oneshot").await, RunStatus::Stopped);
    assert!(!manager.stop("Oneshot").await);
}
