//! Suggested quantity CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_rules::request::QuantityRequest;
use candlepin_rules::{suggested_quantities, suggested_quantity};

/// Arguments for quantity commands
#[derive(Debug, Args)]
pub struct QuantityArgs {
    /// Quantity subcommand
    #[command(subcommand)]
    pub command: QuantityCommand,
}

/// Quantity subcommands
#[derive(Debug, Subcommand)]
pub enum QuantityCommand {
    /// Suggest a quantity for `pool`
    Pool,
    /// Suggest quantities for every entry of `pools`
    Pools,
}

/// Execute quantity commands
pub fn execute(args: &QuantityArgs, input: &str, format: OutputFormat) -> AppResult<()> {
    let request = QuantityRequest::from_json(input)?;
    let consumer = &request.consumer;
    let valid = &request.valid_entitlements;

    match &args.command {
        QuantityCommand::Pool => {
            let pool = request.require_pool()?;
            output::print_json(&suggested_quantity(pool, consumer, valid), format)
        }
        QuantityCommand::Pools => {
            output::print_json(&suggested_quantities(&request.pools, consumer, valid), format)
        }
    }
}
