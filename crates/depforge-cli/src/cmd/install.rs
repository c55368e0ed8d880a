use anyhow::{Context, Result};
use crossterm::style::Stylize;
use depforge_core::io::Fetcher;
use depforge_core::platform::resolve_platform;
use depforge_core::{Dispatcher, ProcessRunner, WorkDirs, installers};
use depforge_schema::BuildConfig;

use crate::Cli;
use crate::ui::ConsoleReporter;

fn print_header(config: &BuildConfig, packages: &[String]) {
    let version = config.llvm_version();
    let support = if version.is_supported() {
        "(supported)".green()
    } else {
        "(unsupported)".yellow()
    };

    println!("Repository path: {}", config.repository_path().display());
    println!("LLVM version: {} {support}", version.long());
    println!("Packages: {}", packages.join(", "));
}

/// Build and install the requested packages in order.
pub fn install(cli: &Cli) -> Result<()> {
    let host = resolve_platform();
    let config = cli.build_config(host.platform)?;
    tracing::debug!(?config, %host, "configuration");
    print_header(&config, &cli.packages);

    let registry = installers::registry()?;
    let dirs = WorkDirs::new(config.work_dir());
    let fetcher =
        Fetcher::with_default_transports(&dirs.temp).context("Failed to set up downloads")?;
    let runner = ProcessRunner::new(config.verbose());
    let reporter = ConsoleReporter::new();

    let dispatcher = Dispatcher::new(&registry, host, &config, &fetcher, &runner, &reporter);
    dispatcher.run(&cli.packages)?;
    Ok(())
}
