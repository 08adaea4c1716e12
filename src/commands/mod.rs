//! CLI command definitions and dispatch.

pub mod autobind;
pub mod compliance;
pub mod pool;
pub mod quantity;
pub mod validate;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_core::config::RulesConfig;

/// Candlepin entitlement policy rules
#[derive(Debug, Parser)]
#[command(name = "candlepin-rules", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Request envelope to read; stdin when omitted or `-`
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compliance status and coverage probes
    Compliance(compliance::ComplianceArgs),
    /// Select pools to auto-attach
    Autobind,
    /// Pre-entitlement validation
    Validate(validate::ValidateArgs),
    /// Suggested bind quantities
    Quantity(quantity::QuantityArgs),
    /// Classify a pool
    PoolType,
    /// Check a pool before adding it to an activation key
    ActivationKey,
    /// Show the consumer profile an activation key's pools imply
    KeyProfile,
    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Execute the parsed command
    pub fn execute(&self, config: &RulesConfig) -> AppResult<()> {
        let format = self.format;
        match &self.command {
            Commands::Config => output::print_json(config, format),
            Commands::Compliance(args) => {
                compliance::execute(args, &self.read_input()?, config, format)
            }
            Commands::Autobind => autobind::execute(&self.read_input()?, config, format),
            Commands::Validate(args) => validate::execute(args, &self.read_input()?, config, format),
            Commands::Quantity(args) => quantity::execute(args, &self.read_input()?, format),
            Commands::PoolType => pool::pool_type(&self.read_input()?, format),
            Commands::ActivationKey => pool::activation_key(&self.read_input()?, format),
            Commands::KeyProfile => pool::key_profile(&self.read_input()?, format),
        }
    }

    fn read_input(&self) -> AppResult<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                tracing::debug!(path = %path.display(), "reading request envelope");
                Ok(std::fs::read_to_string(path)?)
            }
            _ => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }
}
