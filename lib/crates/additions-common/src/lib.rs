pub mod config;
pub mod types;

pub use config::{ServerConfig, ServerConfigError};
pub use types::*;
