//! Unit tests for the additions CLI
//!
//! These tests use in-memory ports and run fast. The only real processes
//! are the short `sh` scripts in `supervised_process`.

mod installer;
mod lifecycle_manager;
mod supervised_process;
