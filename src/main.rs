//! Candlepin rules runner.
//!
//! Reads a request envelope (file or stdin), evaluates it with the policy
//! engine and prints the JSON result on stdout. Logs go to stderr.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use candlepin_core::config::RulesConfig;
use candlepin_core::error::AppError;

mod commands;
mod output;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {e}"));
            std::process::exit(2);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(&config) {
        tracing::error!(kind = %e.kind, "{}", e.message);
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from the optional file plus environment overrides.
fn load_configuration(path: &str) -> Result<RulesConfig, AppError> {
    RulesConfig::load(path)
}

/// Initialize tracing/logging on stderr so stdout carries only results.
fn init_logging(config: &RulesConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
