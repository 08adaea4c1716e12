//! JSON output formatting for rule results.

use serde::Serialize;

use candlepin_core::AppResult;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Pretty,
    /// Single-line JSON
    Compact,
}

/// Print a rule result on stdout in the selected format
pub fn print_json<T: Serialize>(value: &T, format: OutputFormat) -> AppResult<()> {
    let json = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Compact => serde_json::to_string(value)?,
    };
    println!("{json}");
    Ok(())
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}
