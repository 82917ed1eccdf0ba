//! File discovery with gitignore support

pub mod discovery;
pub mod filter;
pub mod git;
pub mod tree;

pub use discovery::{discover, Discovery, DiscoveryStrategy, VcsDiscovery, WalkDiscovery};
pub use filter::{is_ignored, load_ignore_rules, load_patterns, IgnoreRule};
pub use git::{GitRepository, VersionControl};
