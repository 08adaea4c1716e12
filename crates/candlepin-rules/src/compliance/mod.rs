//! Compliance status of a consumer's installed products.

pub mod dates;
pub mod engine;

pub use engine::ComplianceRules;

use candlepin_core::types::attribute::names;
use candlepin_core::types::StackId;
use candlepin_entity::{Consumer, Entitlement};
use tracing::debug;

use crate::coverage::{stack_coverage, Coverage};
use crate::tracker::ComplianceTracker;

/// Coverage of the stack `stack_id` built from every matching entitlement.
pub fn stack_coverage_of(
    consumer: &Consumer,
    stack_id: &StackId,
    entitlements: &[Entitlement],
) -> Coverage {
    debug!(stack = %stack_id, "checking stack compliance");
    let mut tracker = ComplianceTracker::for_stack(consumer, stack_id.clone());
    for ent in entitlements {
        if ent.is_stacked() && ent.pool.stacking_id().unwrap_or_default() == *stack_id {
            tracker.update_from_entitlement(ent);
        }
    }
    stack_coverage(&tracker, entitlements)
}

/// Coverage of a single entitlement on its own.
pub fn entitlement_coverage(
    consumer: &Consumer,
    entitlement: &Entitlement,
    entitlements: &[Entitlement],
) -> Coverage {
    debug!(entitlement = ?entitlement.id, "checking entitlement compliance");
    let mut tracker = ComplianceTracker::for_entitlement(consumer);
    tracker.update_from_entitlement(entitlement);
    stack_coverage(&tracker, entitlements)
}

/// Whether the stack fully covers the consumer.
pub fn is_stack_compliant(
    consumer: &Consumer,
    stack_id: &StackId,
    entitlements: &[Entitlement],
) -> bool {
    stack_coverage_of(consumer, stack_id, entitlements).covered
}

/// Whether the entitlement alone fully covers the consumer.
pub fn is_ent_compliant(
    consumer: &Consumer,
    entitlement: &Entitlement,
    entitlements: &[Entitlement],
) -> bool {
    entitlement_coverage(consumer, entitlement, entitlements).covered
}

/// Whether the entitlement comes from a pool reserved for unmapped guests.
pub fn is_unmapped_guest(entitlement: &Entitlement) -> bool {
    entitlement.pool.is_flag_set(names::UNMAPPED_GUESTS_ONLY)
}
