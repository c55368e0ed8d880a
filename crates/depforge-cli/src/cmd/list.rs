use anyhow::Result;
use crossterm::style::Stylize;
use depforge_core::installers;
use depforge_core::platform::resolve_platform;

/// Print the packages installable on this host, one per line.
pub fn list() -> Result<()> {
    let host = resolve_platform();
    let registry = installers::registry()?;
    let packages = registry.list_packages(host.platform);

    println!("{}", format!("Packages available on {host}:").dark_grey());
    for package in &packages {
        println!("  {package}");
    }
    Ok(())
}
