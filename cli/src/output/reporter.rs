//! Presentation-layer implementations of `ProgressReporter`.
//!
//! Application services emit progress events through the port; these types
//! decide whether they end up on a spinner, the terminal, or the log.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// With a spinner attached, `step()` updates the spinner message instead of
/// printing a line. Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Route `step()` messages to `spinner`.
    #[must_use]
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    /// Remove the spinner from the terminal, if one is attached.
    pub fn clear(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if let Some(pb) = &self.spinner {
            pb.set_message(message.to_string());
        } else if !self.ctx.quiet {
            println!("  {} {message}", "→".cyan());
        }
    }

    fn success(&self, message: &str) {
        self.clear();
        if !self.ctx.quiet {
            println!("  {} {message}", "✓".green());
        }
    }

    fn warn(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "!".yellow());
        }
    }
}

/// Reporter for headless callers such as the loopback endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn step(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}
