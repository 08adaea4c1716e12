//! Pool ranking used when choosing between candidate pools.

use candlepin_core::types::{ProductAttribute, SyspurposeAttribute};
use candlepin_entity::{ComplianceStatus, Consumer, Pool};
use tracing::{debug, trace};

use crate::facts::consumer_value;

const SYSPURPOSE_MATCH_BONUS: f64 = 450.0;
const VIRT_ONLY_BONUS: f64 = 100.0;
const HOST_SPECIFIC_BONUS: f64 = 150.0;
const SHARED_PENALTY: f64 = 10.0;
const UNKNOWN_FIT_BONUS: f64 = 20.0;

const FIT_ATTRIBUTES: [ProductAttribute; 4] = [
    ProductAttribute::Sockets,
    ProductAttribute::Cores,
    ProductAttribute::Ram,
    ProductAttribute::Vcpu,
];

/// Items of `left` not in `right`, removing one match per item of `right`.
fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let mut remaining = left.to_vec();
    for item in right {
        if let Some(index) = remaining.iter().position(|r| r == item) {
            remaining.remove(index);
        }
    }
    remaining
}

fn intersection_len(left: &[String], right: &[String]) -> usize {
    left.iter().filter(|l| right.contains(l)).count()
}

/// Score how desirable `pool` is for the consumer.
///
/// Starts at 100. Each system purpose dimension adds its weighted score,
/// and a pool that satisfies anything the consumer still lacks gets a large
/// bonus. Virt-only and host-specific pools rank higher, shared pools
/// slightly lower, and capacity attributes reward the pool that covers the
/// consumer with the least waste.
pub fn pool_priority(pool: &Pool, consumer: &Consumer, compliance: &ComplianceStatus) -> f64 {
    let mut priority = 100.0;
    let mut matches_purpose = false;

    for attr in SyspurposeAttribute::ALL {
        let specified = consumer.specified_values(attr);
        let unsatisfied = difference(&specified, &compliance.satisfied_values(attr));
        let offered = pool.syspurpose_values(attr);

        let null_rule = if unsatisfied.is_empty() && offered.is_empty() {
            0.1
        } else {
            0.0
        };
        let match_rule = if unsatisfied.is_empty() {
            0.0
        } else {
            intersection_len(&unsatisfied, &offered) as f64 / unsatisfied.len() as f64
        };
        let mismatch_rule = if !specified.is_empty() && !offered.is_empty() {
            difference(&specified, &offered).len() as f64 / specified.len() as f64 * -0.5
        } else {
            0.0
        };

        let score = (null_rule + match_rule + mismatch_rule) * attr.weight();
        if score != 0.0 {
            trace!(pool = %pool.id, attribute = %attr, null_rule, match_rule, mismatch_rule, score, "syspurpose score");
            if match_rule != 0.0 {
                matches_purpose = true;
            }
        }
        priority += score;
    }

    if matches_purpose {
        priority += SYSPURPOSE_MATCH_BONUS;
    }
    if pool.is_virt_only() {
        priority += VIRT_ONLY_BONUS;
    }
    if pool.is_host_specific() {
        priority += HOST_SPECIFIC_BONUS;
    }
    if pool.has_shared_ancestor {
        priority -= SHARED_PENALTY;
    }

    let compliance_attrs = ProductAttribute::for_consumer(consumer.is_guest());
    for attr in FIT_ATTRIBUTES {
        if !compliance_attrs.contains(&attr) {
            continue;
        }
        let needed = consumer_value(attr, consumer);
        match pool.product_attribute_int(attr.as_str()) {
            Some(per_unit) if needed > 0 && per_unit > 0 => {
                let required = (needed + per_unit - 1) / per_unit;
                let multiplier = if attr == ProductAttribute::Sockets {
                    pool.instance_multiplier()
                } else {
                    1
                };
                if pool.available() as f64 / multiplier as f64 >= required as f64 {
                    let waste = (per_unit * required - needed) as f64;
                    let fit = (10.0 - waste - (required - 1) as f64 / 2.0).max(0.0) * 2.0;
                    priority += fit;
                }
            }
            _ => priority += UNKNOWN_FIT_BONUS,
        }
    }

    debug!(pool = %pool.id, priority, "pool priority");
    priority
}

/// Whether `first` should be preferred over `second` when both offer the
/// same products: virt-only first, then host-specific among virt-only,
/// then the pool that expires sooner.
pub fn prefer_pool(first: &Pool, second: &Pool) -> bool {
    match (first.is_virt_only(), second.is_virt_only()) {
        (true, false) => return true,
        (false, true) => return false,
        (true, true) => match (first.is_host_specific(), second.is_host_specific()) {
            (true, false) => return true,
            (false, true) => return false,
            _ => {}
        },
        (false, false) => {}
    }
    second.end_date > first.end_date
}

/// Whether a combination of pools provides each product at most once,
/// ignoring repeats from multi-entitlement pools.
pub fn has_no_product_overlap(pools: &[&Pool]) -> bool {
    let mut seen = Vec::new();
    for pool in pools {
        for product_id in pool.products() {
            if !seen.contains(product_id) {
                seen.push(product_id.clone());
            } else if !pool.is_multi_ent() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlepin_core::types::attribute::facts;
    use chrono::{Duration, Utc};

    fn consumer() -> Consumer {
        Consumer::default().with_fact(facts::SOCKETS, "4")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    fn pool(id: &str) -> Pool {
        let mut pool = Pool::new(id, "prod");
        pool.quantity = 10;
        pool
    }

    #[test]
    fn test_plain_pool_priority() {
        // 100 + 0.1 * (10 + 5 + 3 + 1) null rules + 3 * 20 unknown fit.
        let priority = pool_priority(&pool("p"), &consumer(), &ComplianceStatus::default());
        assert_close(priority, 161.9);
    }

    #[test]
    fn test_exact_socket_fit_beats_wasteful_fit() {
        let status = ComplianceStatus::default();
        let exact = pool("a").with_product_attribute("sockets", "4");
        let wasteful = pool("b").with_product_attribute("sockets", "8");
        let exact_priority = pool_priority(&exact, &consumer(), &status);
        let wasteful_priority = pool_priority(&wasteful, &consumer(), &status);
        assert!(exact_priority > wasteful_priority);
    }

    #[test]
    fn test_virt_and_host_bonus() {
        let status = ComplianceStatus::default();
        let base = pool_priority(&pool("a"), &consumer(), &status);
        let virt = pool("b").with_product_attribute("virt_only", "true");
        let host = pool("c")
            .with_product_attribute("virt_only", "true")
            .with_attribute("requires_host", "host-1");
        assert_close(pool_priority(&virt, &consumer(), &status) - base, 100.0);
        assert_close(pool_priority(&host, &consumer(), &status) - base, 250.0);
    }

    #[test]
    fn test_shared_pool_is_penalised() {
        let status = ComplianceStatus::default();
        let mut shared = pool("a");
        shared.has_shared_ancestor = true;
        let base = pool_priority(&pool("b"), &consumer(), &status);
        assert_close(base - pool_priority(&shared, &consumer(), &status), 10.0);
    }

    #[test]
    fn test_matching_role_adds_purpose_bonus() {
        let status = ComplianceStatus::default();
        let mut consumer = consumer();
        consumer.role = Some("server".into());
        let plain = pool_priority(&pool("a"), &consumer, &status);
        let matching = pool("b").with_product_attribute("roles", "server,desktop");
        let priority = pool_priority(&matching, &consumer, &status);
        assert!(priority - plain > 450.0);
    }

    #[test]
    fn test_prefer_virt_then_host_then_expiry() {
        let virt = pool("v").with_product_attribute("virt_only", "true");
        let host = pool("h")
            .with_product_attribute("virt_only", "true")
            .with_attribute("requires_host", "host-1");
        assert!(prefer_pool(&virt, &pool("p")));
        assert!(!prefer_pool(&pool("p"), &virt));
        assert!(prefer_pool(&host, &virt));

        let mut early = pool("e");
        early.end_date = Utc::now() + Duration::days(10);
        let mut late = pool("l");
        late.end_date = Utc::now() + Duration::days(100);
        assert!(prefer_pool(&early, &late));
        assert!(!prefer_pool(&late, &early));
    }

    #[test]
    fn test_product_overlap() {
        let a = Pool::new("a", "x").with_provided_product("y");
        let b = Pool::new("b", "x");
        assert!(!has_no_product_overlap(&[&a, &b]));
        let multi = Pool::new("c", "x").with_product_attribute("multi-entitlement", "yes");
        assert!(has_no_product_overlap(&[&a, &multi]));
        assert!(has_no_product_overlap(&[&a]));
    }
}
