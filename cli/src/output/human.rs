//! Human-readable terminal renderer.

use std::collections::BTreeMap;
use std::path::Path;

use additions_common::{ExtensionInfo, LogTail, OperationReply, RemoteEntry};
use owo_colors::OwoColorize as _;

use crate::domain::HostConfig;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("additions {version}");
    }

    /// Render the installed extensions as a table.
    pub fn render_list(&self, extensions: &[ExtensionInfo]) {
        if extensions.is_empty() {
            if !self.ctx.quiet {
                println!("No extensions installed. Install one: additions install <name> --url <archive>");
            }
            return;
        }

        for ext in extensions {
            let label = format!("{:<8}", status_label(ext.running));
            let style = if ext.running {
                self.ctx.styles.running
            } else {
                self.ctx.styles.dim
            };
            let status = label.style(style);
            let kind = if ext.based_on.is_empty() { "?" } else { ext.based_on.as_str() };
            println!(
                "  {:<24} {:<10} {:<7} {status} {}",
                ext.name, ext.version, kind, ext.description
            );
            if let Some(reason) = &ext.degraded {
                println!("  {:<24} {}", "", reason.style(self.ctx.styles.warning));
            }
        }
    }

    /// Render a single extension.
    pub fn render_info(&self, ext: &ExtensionInfo) {
        self.ctx.header(&ext.name);
        self.ctx.kv("Description:", &ext.description);
        self.ctx.kv("Version:    ", &ext.version);
        let kind = if ext.based_on.is_empty() { "(unknown)" } else { ext.based_on.as_str() };
        self.ctx.kv("Type:       ", kind);
        self.ctx.kv("Path:       ", &ext.path);
        self.ctx.kv("Status:     ", status_label(ext.running));
        if let Some(link) = &ext.link {
            self.ctx.kv("Link:       ", link);
        }
        if let Some(logo) = &ext.logo {
            self.ctx.kv("Logo:       ", logo);
        }
        if let Some(reason) = &ext.degraded {
            self.ctx.warn(reason);
        }
    }

    /// Render the outcome of a management operation.
    pub fn render_reply(&self, reply: &OperationReply) {
        if reply.success {
            self.ctx.success(&reply.message);
        } else {
            self.ctx.error(&reply.message);
        }
    }

    /// Render the bundles offered for installation.
    pub fn render_remote(&self, remote: &BTreeMap<String, RemoteEntry>) {
        if remote.is_empty() {
            if !self.ctx.quiet {
                println!("No remote extensions configured. Add them under `remote:` in the config file.");
            }
            return;
        }
        for (name, entry) in remote {
            println!("  {name:<24} {:<10} {}", entry.version, entry.description);
            println!("  {:<24} {}", "", entry.url.style(self.ctx.styles.dim));
        }
    }

    /// Render captured process output.
    pub fn render_logs(&self, tail: &LogTail) {
        if tail.lines.is_empty() {
            self.ctx.info(&format!("No output captured for {}", tail.name));
            return;
        }
        for line in &tail.lines {
            println!("{line}");
        }
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &HostConfig, path: &Path, root: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<20} {}", "root:", root.display());
        println!("  {:<20} {}", "listen:", config.listen);
        println!("  {:<20} {}", "python:", config.python);
        println!("  {:<20} {}", "stop_grace_ms:", config.stop_grace_ms);
        println!("  {:<20} {}", "remote:", config.remote.len());
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["ADDITIONS_PATH", "ADDITIONS_CONFIG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }
}

/// Display label for a run flag.
#[must_use]
pub fn status_label(running: bool) -> &'static str {
    if running { "running" } else { "stopped" }
}
