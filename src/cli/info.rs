//! Info command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use super::utils::{resolve_directory, resolve_ignore_file};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, DiscoveryStats, FileClass};
use crate::scan::{discover, load_ignore_rules, Discovery, GitRepository, VersionControl};
use crate::utils::format_with_commas;

#[derive(Args)]
pub struct InfoArgs {
    /// Directory to inspect
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Extra gitignore-style file applied after the root .gitignore
    #[arg(short = 'g', long, value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// Walk the filesystem instead of asking git for the file list
    #[arg(long)]
    pub no_git: bool,

    /// Path to config file (codebase-summarizer.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let root = resolve_directory(&args.directory)?;
    let file_config = load_config(&root, args.config.as_deref())?;
    let config = merge_cli_with_config(
        file_config,
        CliOverrides {
            use_git: args.no_git.then_some(false),
            ignore_file: args.ignore_file,
            ..CliOverrides::default()
        },
    )?;

    let discovery = discover_directory(&root, &config)?;
    print_summary(&root, &discovery);
    println!();
    print_exclusions(&discovery);
    println!("\n{}", discovery.tree);
    Ok(())
}

/// Load ignore rules and run discovery with the configured strategy.
pub(super) fn discover_directory(root: &Path, config: &Config) -> Result<Discovery> {
    let custom = config.ignore_file.as_deref().map(|p| resolve_ignore_file(p, root));
    let rules = load_ignore_rules(root, custom.as_deref())?;
    tracing::debug!("Loaded {} ignore rules", rules.len());

    let git = GitRepository;
    let vcs: Option<&dyn VersionControl> = if config.use_git { Some(&git) } else { None };
    discover(root, &rules, vcs)
}

pub(super) fn print_summary(root: &Path, discovery: &Discovery) {
    let stats = DiscoveryStats::from_records(&discovery.files);
    let name = root.file_name().and_then(|n| n.to_str()).unwrap_or("");
    println!("{} {}", style("Directory:").bold(), name);
    println!("{} {}", style("Discovery:").bold(), discovery.strategy);
    println!("{}", style("Statistics:").bold());
    println!("  Files included: {}", stats.files_included);
    println!("  Files ignored: {}", stats.files_ignored);
    println!("  Binary files: {}", stats.files_binary);
    println!("  Ignored directories: {}", discovery.ignored_dirs.len());
    println!("  Total bytes: {}", format_with_commas(stats.total_bytes_included));
}

/// Ignored directories, ignored files, and binary files, one per line.
pub(super) fn print_exclusions(discovery: &Discovery) {
    if !discovery.ignored_dirs.is_empty() {
        println!("{}", style("Ignored directories:").yellow());
        for dir in &discovery.ignored_dirs {
            println!("  {dir}/");
        }
    }

    for (class, heading) in [(FileClass::Ignored, "Ignored files:"), (FileClass::Binary, "Binary files:")] {
        let listed: Vec<&str> = discovery
            .files
            .iter()
            .filter(|f| f.class == class)
            .map(|f| f.relative_path.as_str())
            .collect();
        if listed.is_empty() {
            continue;
        }
        println!("{}", style(heading).yellow());
        for path in listed {
            println!("  {path}");
        }
    }
}
