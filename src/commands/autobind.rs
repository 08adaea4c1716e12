//! Auto-attach CLI command.

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_core::config::RulesConfig;
use candlepin_rules::AutobindRules;
use candlepin_rules::request::AutobindRequest;

/// Select pools for the request and print pool id to quantity
pub fn execute(input: &str, config: &RulesConfig, format: OutputFormat) -> AppResult<()> {
    let request = AutobindRequest::from_json(input)?;
    let rules = AutobindRules::new(config.autobind.clone());
    let selected = rules.select_pools(&request);
    output::print_json(&selected, format)
}
