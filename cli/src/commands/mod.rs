//! Command implementations

pub mod config;
pub mod info;
pub mod install;
pub mod launch;
pub mod list;
pub mod logs;
pub mod remote;
pub mod remove;
pub mod serve;
pub mod version;

use clap::Args;

/// Arguments for commands that act on one installed extension.
#[derive(Args)]
pub struct NameArgs {
    /// Extension name, as shown by `additions list`
    pub name: String,
}
