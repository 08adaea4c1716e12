//! Rules for attaching pools to activation keys.

use candlepin_core::types::attribute::names;
use candlepin_core::types::ConsumerTypeLabel;
use tracing::debug;

use crate::request::ActivationKeyRequest;
use crate::validation::ValidationResult;

/// Check whether the request's pool may be added to the key.
///
/// A `None` quantity lets the host pick one at registration time, so only
/// explicit quantities are range checked.
pub fn validate_key_pool(request: &ActivationKeyRequest) -> ValidationResult {
    let ActivationKeyRequest { key, pool, quantity } = request;
    let quantity = *quantity;
    let mut result = ValidationResult::default();

    if quantity.is_some_and(|q| q < 1) {
        result.add_error("rulefailed.invalid.quantity");
    }

    if !pool.is_multi_ent() {
        if quantity.is_some_and(|q| q > 1) {
            result.add_error("rulefailed.invalid.nonmultient.quantity");
        }
        if key.contains_pool(pool.id.as_str()) {
            result.add_error("rulefailed.already.exists");
        }
    }

    let person_only = pool
        .attribute(names::REQUIRES_CONSUMER_TYPE)
        .is_some_and(|t| ConsumerTypeLabel::Person.matches(t));
    if person_only {
        result.add_error("rulefailed.actkey.cannot.use.person.pools");
    }

    debug!(pool_id = %pool.id, errors = result.errors.len(), "validated activation key pool");
    result
}
