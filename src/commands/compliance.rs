//! Compliance CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_core::config::RulesConfig;
use candlepin_core::error::AppError;
use candlepin_rules::request::ComplianceRequest;
use candlepin_rules::{ComplianceRules, is_ent_compliant, is_stack_compliant};

/// Arguments for compliance commands
#[derive(Debug, Args)]
pub struct ComplianceArgs {
    /// Compliance subcommand
    #[command(subcommand)]
    pub command: ComplianceCommand,
}

/// Compliance subcommands
#[derive(Debug, Subcommand)]
pub enum ComplianceCommand {
    /// Full compliance status on the request date
    Status,
    /// Whether the request's `stackId` fully covers the consumer
    Stack,
    /// Whether the request's `entitlement` alone covers the consumer
    Entitlement,
}

/// Execute compliance commands
pub fn execute(
    args: &ComplianceArgs,
    input: &str,
    config: &RulesConfig,
    format: OutputFormat,
) -> AppResult<()> {
    let request = ComplianceRequest::from_json(input)?;
    let consumer = &request.consumer;
    let entitlements = &request.entitlements;

    match &args.command {
        ComplianceCommand::Status => {
            let rules = ComplianceRules::new(config.compliance.clone());
            let status = rules.get_status(
                consumer,
                entitlements,
                request.ondate(),
                request.calculate_compliant_until,
                request.calculate_product_compliance_date_ranges,
            );
            output::print_json(&status, format)
        }
        ComplianceCommand::Stack => {
            let stack_id = request
                .stack_id
                .as_ref()
                .ok_or_else(|| AppError::validation("Request carries no 'stackId'"))?;
            output::print_json(&is_stack_compliant(consumer, stack_id, entitlements), format)
        }
        ComplianceCommand::Entitlement => {
            let entitlement = request
                .entitlement
                .as_ref()
                .ok_or_else(|| AppError::validation("Request carries no 'entitlement'"))?;
            output::print_json(&is_ent_compliant(consumer, entitlement, entitlements), format)
        }
    }
}
