//! Pre-entitlement validation CLI commands.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_core::config::RulesConfig;
use candlepin_rules::EntitlementRules;
use candlepin_rules::request::ValidationRequest;

/// Arguments for validation commands
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Evaluate as of this RFC 3339 instant instead of now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    /// Validation subcommand
    #[command(subcommand)]
    pub command: ValidateCommand,
}

/// Validation subcommands
#[derive(Debug, Subcommand)]
pub enum ValidateCommand {
    /// Validate `pool` at `quantity`
    Pool,
    /// Validate each entry of `poolQuantities` at its own quantity
    Batch,
    /// Validate every entry of `pools` at quantity 1
    List,
}

/// Execute validation commands
pub fn execute(
    args: &ValidateArgs,
    input: &str,
    config: &RulesConfig,
    format: OutputFormat,
) -> AppResult<()> {
    let request = ValidationRequest::from_json(input)?;
    let rules = EntitlementRules::new(&config.compliance);
    let now = args.at.unwrap_or_else(Utc::now);

    match &args.command {
        ValidateCommand::Pool => output::print_json(&rules.validate_pool(&request, now)?, format),
        ValidateCommand::Batch => {
            output::print_json(&rules.validate_pools_batch(&request, now), format)
        }
        ValidateCommand::List => output::print_json(&rules.validate_pools_list(&request, now), format),
    }
}
