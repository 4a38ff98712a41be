//! qnasync CLI: reconcile a Q&A knowledge base export with its source of truth.
//!
//! Merges questions that exist only in the live Q&A service export, and the
//! service's suggested questions, back into the source-of-truth sheet.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
