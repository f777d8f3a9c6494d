//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Local extension host: install, launch, and supervise offline bundles
#[derive(Parser)]
#[command(
    name = "additions",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List installed extensions
    List,

    /// Show details of one extension
    Info(commands::NameArgs),

    /// Download and install an extension
    Install(commands::install::InstallArgs),

    /// Remove an installed extension
    Remove(commands::NameArgs),

    /// Start an extension and stay attached until Ctrl-C
    Launch(commands::NameArgs),

    /// Show captured output of an extension
    Logs(commands::logs::LogsArgs),

    /// List extensions available for installation
    Remote,

    /// Serve the management API on a loopback address
    Serve(commands::serve::ServeArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Command {
    /// Default log level when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Serve(_) => "info",
            _ => "warn",
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(ExitCode::SUCCESS);
        }

        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
            yes,
        })?;

        match command {
            Command::List => commands::list::run(&app).await,
            Command::Info(args) => commands::info::run(&app, &args).await,
            Command::Install(args) => commands::install::run(&app, &args).await,
            Command::Remove(args) => commands::remove::run(&app, &args).await,
            Command::Launch(args) => commands::launch::run(&app, &args).await,
            Command::Logs(args) => commands::logs::run(&app, &args).await,
            Command::Remote => commands::remote::run(&app),
            Command::Serve(args) => commands::serve::run(&app, &args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => Ok(ExitCode::SUCCESS),
        }
    }
}
