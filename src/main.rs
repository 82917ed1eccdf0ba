//! codebase-summarizer command-line entry point.

use anyhow::Result;

fn main() -> Result<()> {
    codebase_summarizer::cli::run()
}
