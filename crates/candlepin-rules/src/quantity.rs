//! Suggested bind quantities.

use std::collections::BTreeMap;

use candlepin_core::types::attribute::names;
use candlepin_core::types::PoolId;
use candlepin_entity::{Consumer, Entitlement, Pool};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coverage::quantity_to_cover_stack;
use crate::tracker::ComplianceTracker;

/// A quantity to pre-fill and the step in which it may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedQuantity {
    pub suggested: i64,
    pub increment: i64,
}

impl Default for SuggestedQuantity {
    fn default() -> Self {
        Self {
            suggested: 1,
            increment: 1,
        }
    }
}

/// Suggest how many entitlements the consumer should take from `pool`,
/// given the entitlements it already holds.
///
/// Manifest consumers and pools that cannot be taken more than once always
/// get 1 in steps of 1.
pub fn suggested_quantity(
    pool: &Pool,
    consumer: &Consumer,
    valid_entitlements: &[Entitlement],
) -> SuggestedQuantity {
    let mut result = SuggestedQuantity::default();
    if !pool.is_multi_ent() || consumer.is_manifest() {
        return result;
    }

    if let Some(stack_id) = pool.stacking_id() {
        let mut tracker = ComplianceTracker::from_pool(pool, consumer);
        for ent in valid_entitlements {
            if ent.pool.stacking_id().as_ref() == Some(&stack_id) {
                tracker.update_from_entitlement(ent);
            }
        }
        result.suggested = quantity_to_cover_stack(&mut tracker, pool, valid_entitlements);
    }

    if !consumer.is_guest() {
        if let Some(multiplier) = pool.product_attribute_int(names::INSTANCE_MULTIPLIER) {
            result.increment = multiplier;
        }
    }

    debug!(pool = %pool.id, suggested = result.suggested, increment = result.increment, "suggested quantity");
    result
}

/// [`suggested_quantity`] for many pools at once.
pub fn suggested_quantities(
    pools: &[Pool],
    consumer: &Consumer,
    valid_entitlements: &[Entitlement],
) -> BTreeMap<PoolId, SuggestedQuantity> {
    pools
        .iter()
        .map(|pool| {
            (
                pool.id.clone(),
                suggested_quantity(pool, consumer, valid_entitlements),
            )
        })
        .collect()
}

/// Quantity needed from a stackable multi-entitlement pool to cover the
/// consumer on its own, or 1 for any other pool.
pub fn suggested_pool_quantity(
    pool: &Pool,
    consumer: &Consumer,
    entitlements: &[Entitlement],
) -> i64 {
    if pool.is_multi_ent() && pool.is_stacked() {
        let mut tracker = ComplianceTracker::from_pool(pool, consumer);
        return quantity_to_cover_stack(&mut tracker, pool, entitlements);
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlepin_core::types::attribute::facts;
    use candlepin_entity::ConsumerType;

    fn stackable(id: &str, sockets: &str) -> Pool {
        let mut pool = Pool::new(id, "prod")
            .with_product_attribute("stacking_id", "s1")
            .with_product_attribute("multi-entitlement", "yes")
            .with_product_attribute("sockets", sockets);
        pool.quantity = 10;
        pool
    }

    fn physical(sockets: &str) -> Consumer {
        Consumer::default().with_fact(facts::SOCKETS, sockets)
    }

    #[test]
    fn test_single_use_pool_suggests_one() {
        let pool = Pool::new("p", "prod").with_product_attribute("sockets", "2");
        let result = suggested_quantity(&pool, &physical("8"), &[]);
        assert_eq!(result, SuggestedQuantity::default());
    }

    #[test]
    fn test_manifest_consumer_suggests_one() {
        let mut consumer = physical("8");
        consumer.consumer_type = ConsumerType::new("candlepin", true);
        let result = suggested_quantity(&stackable("p", "2"), &consumer, &[]);
        assert_eq!(result.suggested, 1);
    }

    #[test]
    fn test_stack_suggestion_fills_sockets() {
        let result = suggested_quantity(&stackable("p", "2"), &physical("8"), &[]);
        assert_eq!(result.suggested, 4);
        assert_eq!(result.increment, 1);
    }

    #[test]
    fn test_existing_entitlements_reduce_suggestion() {
        let held = Entitlement::new("e1", stackable("other", "2"), 2);
        let result = suggested_quantity(&stackable("p", "2"), &physical("8"), &[held]);
        assert_eq!(result.suggested, 2);
    }

    #[test]
    fn test_covered_stack_suggests_zero() {
        let held = Entitlement::new("e1", stackable("other", "2"), 4);
        let result = suggested_quantity(&stackable("p", "2"), &physical("8"), &[held]);
        assert_eq!(result.suggested, 0);
    }

    #[test]
    fn test_instance_multiplier_sets_increment_for_physical() {
        let pool = stackable("p", "1").with_product_attribute("instance_multiplier", "2");
        let result = suggested_quantity(&pool, &physical("2"), &[]);
        assert_eq!(result.increment, 2);

        let guest = physical("2").with_fact(facts::IS_VIRT_GUEST, "true");
        let result = suggested_quantity(&pool, &guest, &[]);
        assert_eq!(result.increment, 1);
    }

    #[test]
    fn test_pool_quantity_for_non_stackable_is_one() {
        let pool = Pool::new("p", "prod").with_product_attribute("multi-entitlement", "yes");
        assert_eq!(suggested_pool_quantity(&pool, &physical("8"), &[]), 1);
        assert_eq!(suggested_pool_quantity(&stackable("s", "2"), &physical("8"), &[]), 4);
    }

    #[test]
    fn test_suggested_quantities_keyed_by_pool() {
        let pools = vec![stackable("a", "2"), stackable("b", "4")];
        let results = suggested_quantities(&pools, &physical("8"), &[]);
        assert_eq!(results[&PoolId::from("a")].suggested, 4);
        assert_eq!(results[&PoolId::from("b")].suggested, 2);
    }
}
