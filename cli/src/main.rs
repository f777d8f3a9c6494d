//! Additions CLI - local extension host for offline bundles

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use additions_cli::cli::Cli;
use additions_cli::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.command.default_log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_mode = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json_mode && let Ok(body) = json::format_error(&format!("{e:#}"), "command_failed") {
                println!("{body}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
