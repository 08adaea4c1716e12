//! Pool classification and activation-key CLI commands.

use crate::output::{self, OutputFormat};
use candlepin_core::AppResult;
use candlepin_entity::ActivationKey;
use candlepin_rules::request::{ActivationKeyRequest, PoolTypeRequest};
use candlepin_rules::{PoolTypeResult, validate_key_pool};

/// Print the pool's display type
pub fn pool_type(input: &str, format: OutputFormat) -> AppResult<()> {
    let request = PoolTypeRequest::from_json(input)?;
    output::print_json(&PoolTypeResult::from(&request.pool), format)
}

/// Print whether the pool may be added to the key
pub fn activation_key(input: &str, format: OutputFormat) -> AppResult<()> {
    let request = ActivationKeyRequest::from_json(input)?;
    output::print_json(&validate_key_pool(&request), format)
}

/// Print the profile implied by a bare activation key snapshot
pub fn key_profile(input: &str, format: OutputFormat) -> AppResult<()> {
    let key: ActivationKey = serde_json::from_str(input)?;
    output::print_json(&key.profile(), format)
}
