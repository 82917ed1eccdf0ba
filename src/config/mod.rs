//! Configuration loading and merging
//!
//! Settings come from an optional config file and from command-line flags,
//! with precedence CLI > file > defaults.

pub mod loader;
pub mod merge;

pub use loader::load_config;
pub use merge::{merge_cli_with_config, CliOverrides};
