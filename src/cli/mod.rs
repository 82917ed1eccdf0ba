//! Command-line interface for codebase-summarizer
//!
//! Provides `summarize`, `optimize`, `info` and `completions` subcommands.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod info;
mod optimize;
mod summarize;
mod utils;

/// Summarize a codebase into a structured JSON document with an LLM
#[derive(Parser)]
#[command(name = "codebase-summarizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level: 0 = warnings, 1 = progress, 2 = debug
    #[arg(short, long, global = true, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a directory and write the summary document
    Summarize(Box<summarize::SummarizeArgs>),

    /// Compress an existing summary document
    Optimize(optimize::OptimizeArgs),

    /// Show what would be analyzed without calling the model
    Info(info::InfoArgs),

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence over --verbosity.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_for(cli.verbosity).into()));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Summarize(args) => summarize::run(*args),
        Commands::Optimize(args) => optimize::run(args),
        Commands::Info(args) => info::run(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
