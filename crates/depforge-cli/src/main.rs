//! depforge - native dependency builder CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use depforge_cli::{Cli, cmd};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_packages {
        return cmd::list::list();
    }
    cmd::install::install(&cli)
}
