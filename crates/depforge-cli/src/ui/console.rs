//! Line-oriented console reporter
//!
//! Renders dispatcher and installer progress as prefixed lines:
//! ` > ` for steps, ` i ` for notices, ` ! ` for warnings and ` x ` for
//! failures. Captured subprocess output is dumped verbatim between `===`
//! separators so it can be copied out of the terminal as-is.

use std::io::Write;

use crossterm::style::Stylize;
use depforge_core::Reporter;
use depforge_schema::PackageName;

const SEPARATOR: &str = "===";

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn line(&self, marker: &str, msg: &str) {
        println!(" {marker} {msg}");
    }
}

/// Render the captured log block exactly as the subprocess wrote it.
pub fn format_captured(log: &str) -> String {
    let mut block = String::with_capacity(log.len() + 16);
    block.push_str(SEPARATOR);
    block.push('\n');
    block.push_str(log);
    if !log.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(SEPARATOR);
    block.push('\n');
    block
}

fn write_captured(out: &mut impl Write, log: &str) -> std::io::Result<()> {
    out.write_all(format_captured(log).as_bytes())?;
    out.flush()
}

/// `1m 05s`, or `12.3s` under a minute.
pub fn format_elapsed(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let whole = secs as u64;
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, package: &PackageName) {
        println!();
        println!("{}", format!("[{package}]").bold());
    }

    fn step(&self, description: &str) {
        self.line(">", description);
    }

    fn info(&self, msg: &str) {
        self.line(&"i".cyan().to_string(), msg);
    }

    fn warning(&self, msg: &str) {
        self.line(&"!".yellow().to_string(), msg);
    }

    fn error(&self, msg: &str) {
        eprintln!(" {} {msg}", "x".red());
    }

    fn done(&self, package: &PackageName) {
        self.line(&"✓".green().to_string(), &format!("{package} installed"));
    }

    fn failed(&self, package: &PackageName, reason: &str) {
        eprintln!(" {} {package}: {reason}", "x".red());
    }

    fn captured_output(&self, log: &str) {
        if let Err(e) = write_captured(&mut std::io::stderr().lock(), log) {
            tracing::warn!("failed to write captured output: {e}");
        }
    }

    fn summary(&self, installed: usize, failed: usize, not_attempted: usize, elapsed_secs: f64) {
        println!();
        let mut parts = vec![format!("{installed} installed").green().to_string()];
        if failed > 0 {
            parts.push(format!("{failed} failed").red().to_string());
        }
        if not_attempted > 0 {
            parts.push(format!("{not_attempted} not attempted").yellow().to_string());
        }
        println!(
            "{} in {}",
            parts.join(", "),
            format_elapsed(elapsed_secs).dark_grey()
        );
    }
}
