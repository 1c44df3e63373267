//! tenderwatch CLI: batch-match a public tender feed against industry profiles.
//!
//! Reads the feed, keeps notices in the configured regions that hit an
//! industry's classification codes or keywords, and writes a filtered CSV,
//! a run summary, and one document per matched notice.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
