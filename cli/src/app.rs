//! Application context — unified state passed to every command handler.
//!
//! `AppContext` is built once in `Cli::run()` and carries output settings,
//! the loaded configuration, and the resolved bundle root. Commands that
//! manage extensions ask it for a host wired to the view opener they need.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{ConfigStore, ViewOpener};
use crate::application::services::config_service;
use crate::domain::HostConfig;
use crate::domain::bundle::ROOT_ENV_VAR;
use crate::infra::config::{YamlConfigStore, additions_home};
use crate::infra::{LocalHost, build_host};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Skip interactive prompts (also set by `CI` / `ADDITIONS_YES` env vars).
    pub yes: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration persistence.
    pub config_store: YamlConfigStore,
    /// Configuration as loaded at startup.
    pub config: HostConfig,
    /// Bundle root after environment and config overrides.
    pub root: PathBuf,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or the home
    /// directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("ADDITIONS_YES").is_ok();
        let non_interactive = flags.yes || ci_env;

        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let config_store = YamlConfigStore;
        let config = config_service::load_config(&config_store)?;
        let root = config_service::resolve_root(
            &config,
            std::env::var_os(ROOT_ENV_VAR).map(PathBuf::from),
            additions_home()?.join("additions"),
        );
        let root = std::path::absolute(&root).unwrap_or(root);

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            config_store,
            config,
            root,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Build an extension host over the configured root.
    pub fn host<V: ViewOpener>(&self, views: V) -> LocalHost<V> {
        build_host(self.root.clone(), &self.config, views)
    }

    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn config_path(&self) -> Result<PathBuf> {
        self.config_store.path()
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `ADDITIONS_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
