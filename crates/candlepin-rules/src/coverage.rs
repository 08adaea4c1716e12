//! Determines how much of a consumer a tracker covers.

use candlepin_core::types::attribute::{facts, names};
use candlepin_core::types::ProductAttribute;
use candlepin_entity::{ComplianceReason, Consumer, Entitlement, Pool};
use serde::Serialize;
use tracing::debug;

use crate::arch::architecture_matches;
use crate::facts::{consumer_value, global_value};
use crate::tracker::{AccumulatedValue, ComplianceTracker};

/// Result of checking a tracker against a consumer.
#[derive(Debug, Clone, Serialize)]
pub struct Coverage {
    /// Whether every relevant attribute is covered.
    pub covered: bool,
    /// Fraction of relevant attributes covered.
    pub percentage: f64,
    /// One reason per uncovered attribute.
    pub reasons: Vec<ComplianceReason>,
}

impl Coverage {
    /// Whether any reason names one of `attrs`.
    pub fn fails_on(&self, attrs: &[ProductAttribute]) -> bool {
        self.reasons
            .iter()
            .any(|r| attrs.iter().any(|a| r.attribute_key() == a.as_str()))
    }
}

/// Check every attribute relevant to the consumer against the tracker.
///
/// Attributes the tracker does not enforce count as covered. Global
/// attributes are measured across `entitlements` rather than the tracker.
pub fn stack_coverage(tracker: &ComplianceTracker<'_>, entitlements: &[Entitlement]) -> Coverage {
    let consumer = tracker.consumer();
    let attrs = ProductAttribute::for_consumer(consumer.is_guest());

    let mut covered_count = 0usize;
    let mut reasons = Vec::new();
    for &attr in attrs {
        if !tracker.enforces(attr) {
            covered_count += 1;
            continue;
        }
        match check_attribute(attr, tracker, entitlements) {
            None => covered_count += 1,
            Some(reason) => reasons.push(reason),
        }
    }

    let percentage = covered_count as f64 / attrs.len() as f64;
    debug!(percentage, reasons = reasons.len(), "stack coverage");
    Coverage {
        covered: covered_count == attrs.len(),
        percentage,
        reasons,
    }
}

fn check_attribute(
    attr: ProductAttribute,
    tracker: &ComplianceTracker<'_>,
    entitlements: &[Entitlement],
) -> Option<ComplianceReason> {
    let consumer = tracker.consumer();
    let accumulated = tracker.accumulated(attr);
    let reason = |has: String, covered: String| {
        debug!(attribute = %attr, %has, %covered, "attribute not covered");
        Some(ComplianceReason::attribute(
            attr.as_str(),
            &tracker.reason_source(),
            has,
            covered,
        ))
    };

    match attr {
        ProductAttribute::Arch => {
            let consumer_arch = consumer.fact(facts::ARCH);
            let supported = accumulated.map(AccumulatedValue::values).unwrap_or_default();
            for arch in supported {
                if !architecture_matches(
                    Some(arch.as_str()),
                    consumer_arch,
                    &consumer.consumer_type.label,
                ) {
                    return reason(consumer_arch.unwrap_or_default().to_string(), arch.clone());
                }
            }
            None
        }
        ProductAttribute::Addons => {
            let supported = accumulated.map(AccumulatedValue::values).unwrap_or_default();
            if consumer.add_ons.iter().any(|a| supported.contains(a)) {
                None
            } else {
                reason(consumer.add_ons.join(","), supported.join(","))
            }
        }
        ProductAttribute::Role => {
            let supported = accumulated.map(AccumulatedValue::values).unwrap_or_default();
            let role = consumer.role.clone().unwrap_or_default();
            if supported.contains(&role) {
                None
            } else {
                reason(role, supported.join(","))
            }
        }
        ProductAttribute::GuestLimit => {
            let needed = consumer_value(attr, consumer);
            let limit = effective_quantity(attr, accumulated, entitlements);
            match limit {
                Some(-1) => None,
                Some(limit) if limit >= needed => None,
                _ => reason(needed.to_string(), render(limit)),
            }
        }
        ProductAttribute::Sockets
        | ProductAttribute::Cores
        | ProductAttribute::Ram
        | ProductAttribute::Vcpu
        | ProductAttribute::StorageBand => {
            let needed = consumer_value(attr, consumer);
            let provided = effective_quantity(attr, accumulated, entitlements);
            match provided {
                Some(provided) if provided >= needed => None,
                _ => reason(needed.to_string(), render(provided)),
            }
        }
    }
}

fn effective_quantity(
    attr: ProductAttribute,
    accumulated: Option<&AccumulatedValue>,
    entitlements: &[Entitlement],
) -> Option<i64> {
    if attr.is_global() {
        global_value(attr, entitlements)
    } else {
        accumulated.and_then(AccumulatedValue::quantity)
    }
}

fn render(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// How many entitlements from `pool` must be added to the tracker before
/// the consumer is covered.
///
/// Only attributes that stacking can change are considered. Quantity grows
/// by the pool's instance multiplier for physical consumers, and stops once
/// the pool's available quantity would be exceeded (never for unlimited
/// pools, where it stops once adding more no longer changes anything).
pub fn quantity_to_cover_stack(
    tracker: &mut ComplianceTracker<'_>,
    pool: &Pool,
    entitlements: &[Entitlement],
) -> i64 {
    let consumer = tracker.consumer();
    let attrs_to_use: Vec<ProductAttribute> = ProductAttribute::for_consumer(consumer.is_guest())
        .iter()
        .copied()
        .filter(|a| a.affects_quantity() && pool.has_product_attribute(a.as_str()))
        .collect();

    let increment = increment_for(pool, consumer);
    let mut quantity = 0;
    let mut first = !tracker.is_empty();
    loop {
        // An empty tracker needs at least one entitlement even when nothing
        // is enforced.
        let before = snapshot(tracker, &attrs_to_use);
        if !first {
            tracker.update_from_pool(pool, increment);
            quantity += increment;
        }
        let progressed = first || before != snapshot(tracker, &attrs_to_use);
        first = false;

        let covered = !stack_coverage(tracker, entitlements).fails_on(&attrs_to_use);
        if covered {
            break;
        }
        let room = pool.is_unlimited() || quantity + increment <= pool.available();
        if !room || (pool.is_unlimited() && !progressed) {
            break;
        }
    }

    debug!(pool = %pool.id, quantity, "quantity required to cover consumer");
    quantity
}

/// Step size for quantities taken from `pool` by `consumer`.
pub fn increment_for(pool: &Pool, consumer: &Consumer) -> i64 {
    if consumer.is_guest() {
        return 1;
    }
    pool.product_attribute_int(names::INSTANCE_MULTIPLIER)
        .filter(|m| *m > 0)
        .unwrap_or(1)
}

fn snapshot(tracker: &ComplianceTracker<'_>, attrs: &[ProductAttribute]) -> Vec<Option<AccumulatedValue>> {
    attrs.iter().map(|a| tracker.accumulated(*a).cloned()).collect()
}
