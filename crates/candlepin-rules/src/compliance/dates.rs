//! Date probes built on top of the per-date status: how long the consumer
//! stays compliant, and the window each installed product is covered in.

use std::collections::BTreeMap;

use candlepin_core::types::ProductId;
use candlepin_entity::{ComplianceStatus, Consumer, DateRange, Entitlement};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::engine::ComplianceRules;

/// Coverage state of one product at a probe date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductState {
    Compliant,
    Partial,
    NonCompliant,
}

impl ProductState {
    fn of(status: &ComplianceStatus, product_id: &str) -> Self {
        if status.is_product_compliant(product_id) {
            Self::Compliant
        } else if status.is_product_partial(product_id) {
            Self::Partial
        } else {
            Self::NonCompliant
        }
    }
}

/// Sorted, de-duplicated dates.
fn sorted_dates(dates: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<DateTime<Utc>> {
    let mut dates: Vec<DateTime<Utc>> = dates.into_iter().collect();
    dates.sort();
    dates.dedup();
    dates
}

impl ComplianceRules {
    /// The first moment after `on` at which the consumer stops being
    /// compliant, probing one second past each relevant end date.
    ///
    /// Returns `None` when no installed product is tracked or compliance
    /// never lapses within the known end dates.
    pub fn compliant_until(
        &self,
        consumer: &Consumer,
        entitlements: &[Entitlement],
        on: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if consumer.installed_products.is_empty() {
            return None;
        }

        let end_dates = sorted_dates(
            entitlements
                .iter()
                .filter(|e| {
                    consumer
                        .installed_products
                        .iter()
                        .any(|p| e.pool.provides(p.product_id.as_str()))
                })
                .map(Entitlement::ends),
        );

        let mut last = on;
        for end in end_dates {
            if end <= last {
                continue;
            }
            let probe = end + Duration::seconds(1);
            let status = self.status_on_date(consumer, entitlements, probe);
            if !status.is_compliant() {
                debug!(consumer = %consumer.uuid, %probe, "compliance lapses");
                return Some(probe);
            }
            last = end;
        }
        None
    }

    /// Window during which each covered product stays covered at its
    /// current level, walking entitlement boundaries outward from `on`.
    pub fn product_date_ranges(
        &self,
        consumer: &Consumer,
        entitlements: &[Entitlement],
        on: DateTime<Utc>,
        status: &ComplianceStatus,
    ) -> BTreeMap<ProductId, DateRange> {
        let dates = sorted_dates(
            entitlements
                .iter()
                .flat_map(|e| [e.starts(), e.ends()]),
        );
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return BTreeMap::new();
        };

        let next = dates.iter().take_while(|d| **d <= on).count();

        let products: Vec<ProductId> = consumer
            .installed_products
            .iter()
            .map(|p| p.product_id.clone())
            .filter(|p| !status.is_product_non_compliant(p.as_str()))
            .collect();

        let initial: BTreeMap<&ProductId, ProductState> = products
            .iter()
            .map(|p| (p, ProductState::of(status, p.as_str())))
            .collect();

        let probe = |date: DateTime<Utc>| {
            self.status_on_date(consumer, entitlements, date + Duration::milliseconds(1))
        };

        let mut starts: BTreeMap<&ProductId, DateTime<Utc>> = BTreeMap::new();
        let mut last_valid = on;
        for date in dates[..next].iter().rev() {
            let probed = probe(*date);
            for product_id in &products {
                if starts.contains_key(product_id) {
                    continue;
                }
                let now = ProductState::of(&probed, product_id.as_str());
                if now == ProductState::NonCompliant || now != initial[product_id] {
                    starts.insert(product_id, last_valid);
                }
            }
            last_valid = *date;
        }

        let mut ends: BTreeMap<&ProductId, DateTime<Utc>> = BTreeMap::new();
        for date in &dates[next..] {
            let probed = probe(*date);
            for product_id in &products {
                if ends.contains_key(product_id) {
                    continue;
                }
                let now = ProductState::of(&probed, product_id.as_str());
                let lapsed = match initial[product_id] {
                    ProductState::Compliant => now != ProductState::Compliant,
                    ProductState::Partial => now == ProductState::NonCompliant,
                    ProductState::NonCompliant => true,
                };
                if lapsed {
                    ends.insert(product_id, *date);
                }
            }
        }

        products
            .iter()
            .map(|p| {
                let start = starts.get(p).copied().unwrap_or(first);
                let end = ends.get(p).copied().unwrap_or(last);
                (p.clone(), DateRange::new(start, end))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlepin_core::types::attribute::facts;
    use candlepin_entity::Pool;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn ent(id: &str, product: &str, start: u32, end: u32) -> Entitlement {
        Entitlement::new(id, Pool::new(id, product), 1).with_dates(day(start), day(end))
    }

    #[test]
    fn test_compliant_until_is_first_gap() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default().with_installed_product("p1");
        let ents = vec![ent("e1", "p1", 1, 10), ent("e2", "p1", 10, 20)];
        let until = rules.compliant_until(&consumer, &ents, day(5));
        assert_eq!(until, Some(day(20) + Duration::seconds(1)));
    }

    #[test]
    fn test_compliant_until_stops_at_gap() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default().with_installed_product("p1");
        let ents = vec![ent("e1", "p1", 1, 10), ent("e2", "p1", 15, 20)];
        let until = rules.compliant_until(&consumer, &ents, day(5));
        assert_eq!(until, Some(day(10) + Duration::seconds(1)));
    }

    #[test]
    fn test_compliant_until_without_products() {
        let rules = ComplianceRules::default();
        let ents = vec![ent("e1", "p1", 1, 10)];
        assert_eq!(rules.compliant_until(&Consumer::default(), &ents, day(5)), None);
    }

    #[test]
    fn test_get_status_sets_compliant_until() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default().with_installed_product("p1");
        let ents = vec![ent("e1", "p1", 1, 10)];
        let status = rules.get_status(&consumer, &ents, day(5), Some(true), Some(false));
        assert_eq!(status.compliant_until, Some(day(10) + Duration::seconds(1)));
        assert!(status.product_compliance_date_ranges.is_none());

        let skipped = rules.get_status(&consumer, &ents, day(5), Some(false), Some(false));
        assert!(skipped.compliant_until.is_none());
    }

    #[test]
    fn test_date_ranges_span_adjacent_entitlements() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default().with_installed_product("p1");
        let ents = vec![ent("e1", "p1", 1, 10), ent("e2", "p1", 10, 20)];
        let status = rules.status_on_date(&consumer, &ents, day(5));
        let ranges = rules.product_date_ranges(&consumer, &ents, day(5), &status);
        let range = ranges[&ProductId::from("p1")];
        assert_eq!(range.start_date, day(1));
        assert_eq!(range.end_date, day(20));
    }

    #[test]
    fn test_date_ranges_end_at_downgrade() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default()
            .with_fact(facts::SOCKETS, "4")
            .with_installed_product("p1");
        let stacked = |id: &str, start: u32, end: u32| {
            let pool = Pool::new(id, "p1")
                .with_product_attribute("stacking_id", "s")
                .with_product_attribute("sockets", "2");
            Entitlement::new(id, pool, 1).with_dates(day(start), day(end))
        };
        let ents = vec![stacked("a", 1, 20), stacked("b", 1, 10)];
        let status = rules.status_on_date(&consumer, &ents, day(5));
        assert!(status.is_product_compliant("p1"));
        let ranges = rules.product_date_ranges(&consumer, &ents, day(5), &status);
        let range = ranges[&ProductId::from("p1")];
        assert_eq!(range.start_date, day(1));
        assert_eq!(range.end_date, day(10));
    }

    #[test]
    fn test_date_ranges_skip_uncovered_products() {
        let rules = ComplianceRules::default();
        let consumer = Consumer::default()
            .with_installed_product("p1")
            .with_installed_product("p2");
        let ents = vec![ent("e1", "p1", 1, 10)];
        let status = rules.status_on_date(&consumer, &ents, day(5));
        let ranges = rules.product_date_ranges(&consumer, &ents, day(5), &status);
        assert!(ranges.contains_key(&ProductId::from("p1")));
        assert!(!ranges.contains_key(&ProductId::from("p2")));
    }
}
