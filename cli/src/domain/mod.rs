//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`
//! sockets. All functions are synchronous and take data in, returning data out.

pub mod bundle;
pub mod config;
pub mod error;
pub mod manifest;
pub mod runtime;

pub use bundle::{BundleRecord, Catalog, validate_bundle_name};
pub use config::{HostConfig, apply_config_value, validate_config_key, validate_config_value};
pub use error::{ActivationError, CatalogError, ConfigError, InstallError, LoadError, RemoveError};
pub use manifest::{ActivationKind, Manifest};
pub use runtime::{Activation, RunStatus, ViewRequest, ViewTarget};
