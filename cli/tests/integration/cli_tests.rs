//! Integration tests for the CLI surface: help, version, global flags.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::support::Sandbox;

#[test]
fn test_cli_no_args_shows_help() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    Sandbox::new()
        .cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Local extension host"));
}

#[test]
fn test_cli_help_lists_commands() {
    let output = Sandbox::new().cmd().arg("--help").output().expect("run");
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["list", "install", "remove", "launch", "logs", "serve", "config"] {
        assert!(help.contains(command), "help is missing `{command}`");
    }
}

#[test]
fn test_version_command_shows_version() {
    Sandbox::new()
        .cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!("additions ", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = Sandbox::new()
        .cmd()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_fails() {
    Sandbox::new()
        .cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_command_error_in_json_mode_is_json() {
    let output = Sandbox::new()
        .cmd()
        .args(["info", "Ghost", "--json"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["message"], "Extension 'Ghost' not found.");
}
