//! Consumer-side values that product attributes are compared against.

use candlepin_core::types::attribute::facts;
use candlepin_core::types::ProductAttribute;
use candlepin_core::util::parse_int;
use candlepin_entity::{Consumer, Entitlement};
use tracing::trace;

/// Bytes-per-unit divisor taking the kB memory fact to GB.
const KB_PER_GB: f64 = 1024.0 * 1024.0;

/// The raw integer fact for `attr`, or 1 when the fact is absent.
fn raw_fact(attr: ProductAttribute, consumer: &Consumer) -> i64 {
    attr.consumer_fact()
        .and_then(|name| consumer.non_empty_fact(name))
        .and_then(parse_int)
        .unwrap_or(1)
}

/// Compute the consumer's value for a product attribute.
///
/// Facts default to 1 when missing. RAM is converted from kB to whole GB,
/// cores multiply cores-per-socket by sockets, vCPUs reuse the core count
/// and the guest limit counts the consumer's active guests.
pub fn consumer_value(attr: ProductAttribute, consumer: &Consumer) -> i64 {
    let value = match attr {
        ProductAttribute::Ram => {
            let kb = consumer
                .non_empty_fact(facts::RAM)
                .and_then(parse_int)
                .unwrap_or(1);
            (kb as f64 / KB_PER_GB).round() as i64
        }
        ProductAttribute::Cores | ProductAttribute::Vcpu => {
            raw_fact(ProductAttribute::Cores, consumer)
                * raw_fact(ProductAttribute::Sockets, consumer)
        }
        ProductAttribute::GuestLimit => consumer.active_guest_count(),
        ProductAttribute::Sockets
        | ProductAttribute::StorageBand
        | ProductAttribute::Arch
        | ProductAttribute::Role
        | ProductAttribute::Addons => raw_fact(attr, consumer),
    };
    trace!(attribute = %attr, value, "calculated consumer fact");
    value
}

/// Aggregate an attribute across every entitlement the consumer holds.
///
/// The guest limit is the largest declared limit, with any `-1` meaning
/// unlimited, and `None` when no entitlement declares one. Every other
/// attribute is summed, unparsable values counting as zero.
pub fn global_value(attr: ProductAttribute, entitlements: &[Entitlement]) -> Option<i64> {
    let declared = entitlements
        .iter()
        .filter_map(|ent| ent.pool.product_attribute(attr.as_str()));

    let value = match attr {
        ProductAttribute::GuestLimit => {
            let mut limit: Option<i64> = None;
            for raw in declared {
                let value = parse_int(raw).unwrap_or(0);
                if value == -1 {
                    return Some(-1);
                }
                limit = Some(limit.map_or(value, |l| l.max(value)));
            }
            limit
        }
        _ => Some(declared.map(|raw| parse_int(raw).unwrap_or(0)).sum()),
    };
    trace!(attribute = %attr, ?value, "calculated global attribute");
    value
}
