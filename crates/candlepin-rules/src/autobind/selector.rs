//! Greedy selection of the pools that best cover a consumer.

use std::collections::BTreeMap;

use candlepin_core::config::AutobindConfig;
use candlepin_core::types::attribute::{facts, names};
use candlepin_core::types::{PoolId, ProductAttribute, ProductId, StackId, SyspurposeAttribute};
use candlepin_core::util::equals_ignore_case;
use candlepin_entity::{ComplianceStatus, Consumer, Entitlement, Pool};
use tracing::{debug, info};

use super::group::{Candidate, EntitlementGroup};
use super::priority::pool_priority;
use crate::arch::architecture_matches;
use crate::quantity::suggested_pool_quantity;
use crate::request::AutobindRequest;

/// Chooses pools for auto-attach.
#[derive(Debug, Clone, Default)]
pub struct AutobindRules {
    config: AutobindConfig,
}

/// What a consumer still needs after its attached entitlements.
#[derive(Debug, Clone, Default)]
struct Needs {
    installed: Vec<ProductId>,
    role: String,
    addons: Vec<String>,
}

impl AutobindRules {
    pub fn new(config: AutobindConfig) -> Self {
        Self { config }
    }

    /// Select pools and quantities that bring the consumer into compliance.
    pub fn select_pools(&self, request: &AutobindRequest) -> BTreeMap<PoolId, i64> {
        let consumer = &request.consumer;
        let compliance = &request.compliance;
        debug!(consider_derived = request.consider_derived, "selecting pools");

        let attached = attached_entitlements(compliance);
        let candidates: Vec<Candidate> = request
            .pools
            .iter()
            .map(|pool| Candidate {
                currently_available: currently_available(pool, consumer),
                priority: pool_priority(pool, consumer, compliance),
                pool: pool.clone(),
            })
            .filter(|c| self.is_valid(c, request, &attached))
            .collect();

        let mut needs = Needs {
            installed: request
                .products
                .iter()
                .map(|p| ProductId::from(p.as_str()))
                .filter(|p| !compliance.compliant_products.contains_key(p))
                .collect(),
            role: remaining_role(consumer.role.as_deref(), &attached),
            addons: remaining_addons(&consumer.add_ons, &attached),
        };
        debug!(installed = ?needs.installed, role = %needs.role, addons = ?needs.addons, "remaining needs");

        let groups = build_groups(
            &candidates,
            &needs.installed,
            consumer,
            &attached,
            request.consider_derived,
        );
        debug!(groups = groups.len(), "built entitlement groups");

        let mut valid = Vec::new();
        for mut group in groups.into_iter().rev() {
            if !group.validate() {
                debug!(stack = %group.stack_id(), "group failed validation");
                continue;
            }
            let useful = !common_products(&needs.installed, &group).is_empty()
                || !common_role(&needs.role, &group).is_empty()
                || !common_addons(&needs.addons, &group).is_empty()
                || group.extends_attached_stack();
            if !useful {
                debug!(stack = %group.stack_id(), "group provides no needed products");
                continue;
            }
            group.remove_extra_attrs(&needs.role, &needs.addons, self.config.max_stacking_attributes);
            group.prune_pools(&needs.role, &needs.addons);
            valid.push(group);
        }
        debug!(valid = valid.len(), "valid entitlement groups");

        let best = best_groups(&mut valid, &mut needs, compliance);

        let mut selected = BTreeMap::new();
        for index in best {
            for (pool_id, quantity) in valid[index].pool_quantities() {
                selected.insert(pool_id.clone(), *quantity);
            }
        }
        info!(consumer = %consumer.uuid, selected = ?selected, "auto-bind selection");
        selected
    }

    fn is_valid(&self, candidate: &Candidate, request: &AutobindRequest, attached: &[Entitlement]) -> bool {
        let pool = &candidate.pool;
        let consumer = &request.consumer;

        if !architecture_matches(
            pool.product_attribute(ProductAttribute::Arch.as_str()),
            consumer.fact(facts::ARCH),
            &consumer.consumer_type.label,
        ) {
            debug!(pool = %pool.id, "skipping pool: arch does not match consumer");
            return false;
        }
        if !consumer.is_guest() && pool.is_virt_only() {
            debug!(pool = %pool.id, "skipping pool: physical consumer cannot use virt-only pool");
            return false;
        }
        if !self.is_sla_valid(pool, request, attached) {
            debug!(pool = %pool.id, "skipping pool: service level does not match");
            return false;
        }
        if candidate.currently_available <= 0 {
            debug!(pool = %pool.id, "skipping pool: all entitlements consumed");
            return false;
        }
        true
    }

    fn is_exempt(&self, level: &str, request: &AutobindRequest) -> bool {
        request
            .exempt_list
            .iter()
            .chain(self.config.exempt_service_levels.iter())
            .any(|exempt| equals_ignore_case(Some(exempt), Some(level)))
    }

    /// A pool without a service level, or with an exempt one, always
    /// passes. Otherwise it must match the requested level, or when none is
    /// requested, a level the consumer is already entitled at.
    fn is_sla_valid(&self, pool: &Pool, request: &AutobindRequest, attached: &[Entitlement]) -> bool {
        let Some(pool_sla) = pool
            .product_attribute(names::SUPPORT_LEVEL)
            .filter(|s| !s.is_empty())
        else {
            return true;
        };
        if self.is_exempt(pool_sla, request) {
            return true;
        }
        if let Some(requested) = request.requested_service_level() {
            return equals_ignore_case(Some(requested), Some(pool_sla));
        }

        let existing: Vec<&str> = attached
            .iter()
            .filter_map(|e| e.pool.product_attribute(names::SUPPORT_LEVEL))
            .filter(|s| !s.is_empty())
            .collect();
        existing.is_empty()
            || existing
                .iter()
                .any(|sla| equals_ignore_case(Some(sla), Some(pool_sla)))
    }
}

/// How many entitlements auto-bind may take from the pool.
///
/// Unlimited pools offer what the consumer needs to be covered by them
/// alone. Single-use pools never offer more than one.
fn currently_available(pool: &Pool, consumer: &Consumer) -> i64 {
    let available = if pool.is_unlimited() {
        suggested_pool_quantity(pool, consumer, &[])
    } else {
        pool.available()
    };
    if available > 0 && !pool.is_multi_ent() {
        1
    } else {
        available
    }
}

/// Every entitlement in the status, each id once.
fn attached_entitlements(compliance: &ComplianceStatus) -> Vec<Entitlement> {
    let mut attached: Vec<Entitlement> = Vec::new();
    let all = compliance
        .partial_stacks
        .values()
        .chain(compliance.partially_compliant_products.values())
        .chain(compliance.compliant_products.values())
        .flatten();
    for ent in all {
        let seen = ent.id.is_some() && attached.iter().any(|a| a.id == ent.id);
        if !seen {
            attached.push(ent.clone());
        }
    }
    attached
}

fn attached_values(attached: &[Entitlement], attr: SyspurposeAttribute) -> Vec<String> {
    attached
        .iter()
        .flat_map(|e| e.pool.syspurpose_values(attr))
        .collect()
}

fn remaining_role(role: Option<&str>, attached: &[Entitlement]) -> String {
    let Some(role) = role.filter(|r| !r.is_empty()) else {
        return String::new();
    };
    if attached_values(attached, SyspurposeAttribute::Roles)
        .iter()
        .any(|r| r == role)
    {
        return String::new();
    }
    role.to_string()
}

fn remaining_addons(addons: &[String], attached: &[Entitlement]) -> Vec<String> {
    let covered = attached_values(attached, SyspurposeAttribute::Addons);
    addons
        .iter()
        .filter(|a| !covered.contains(a))
        .cloned()
        .collect()
}

/// One group per stacking id, one per unstacked pool, in pool order.
fn build_groups<'a>(
    candidates: &'a [Candidate],
    installed: &[ProductId],
    consumer: &'a Consumer,
    attached: &'a [Entitlement],
    consider_derived: bool,
) -> Vec<EntitlementGroup<'a>> {
    let mut groups: Vec<EntitlementGroup<'a>> = Vec::new();
    for candidate in candidates {
        let stack_id: Option<StackId> = candidate
            .pool
            .is_stacked()
            .then(|| candidate.pool.stacking_id().unwrap_or_default());

        if let Some(stack_id) = &stack_id {
            if let Some(group) = groups
                .iter_mut()
                .find(|g| g.is_stackable() && g.stack_id() == stack_id)
            {
                group.add_pool(candidate);
                continue;
            }
        }
        let mut group = EntitlementGroup::new(
            consumer,
            stack_id,
            installed.to_vec(),
            attached,
            consider_derived,
        );
        group.add_pool(candidate);
        groups.push(group);
    }
    groups
}

fn common_products(installed: &[ProductId], group: &EntitlementGroup<'_>) -> Vec<ProductId> {
    group
        .provided_products()
        .into_iter()
        .filter(|p| installed.contains(p))
        .collect()
}

fn common_addons(addons: &[String], group: &EntitlementGroup<'_>) -> Vec<String> {
    group
        .addons()
        .into_iter()
        .filter(|a| addons.contains(a))
        .collect()
}

fn common_role(role: &str, group: &EntitlementGroup<'_>) -> String {
    if !role.is_empty() && group.roles().iter().any(|r| r == role) {
        role.to_string()
    } else {
        String::new()
    }
}

/// Index of the most desirable group that still adds something.
fn find_best_group(
    groups: &[EntitlementGroup<'_>],
    selected: &[usize],
    needs: &Needs,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_stacked = false;
    let mut best_quantity = i64::MAX;
    let mut best_priority = 0.0;
    let mut best_host_specific = 0;
    let mut best_virt_only = 0;
    let mut host_specific_found = false;
    let mut virt_only_found = false;

    for (index, group) in groups.iter().enumerate() {
        if selected.contains(&index) {
            continue;
        }
        let intersection = common_products(&needs.installed, group).len();
        let role_needed = !common_role(&needs.role, group).is_empty();
        let addons_needed = !common_addons(&needs.addons, group).is_empty();
        let host_specific = group.num_host_specific();
        let virt_only = group.num_virt_only();

        if !role_needed
            && !addons_needed
            && (intersection == 0
                || (host_specific_found && host_specific < best_host_specific)
                || (virt_only_found && virt_only < best_virt_only))
        {
            continue;
        }

        let priority = group.average_priority();
        let quantity = group.total_quantity();
        let better = if host_specific != best_host_specific {
            host_specific_found |= host_specific > best_host_specific;
            host_specific > best_host_specific
        } else if virt_only != best_virt_only {
            virt_only_found |= virt_only > best_virt_only;
            virt_only > best_virt_only
        } else if priority != best_priority {
            priority > best_priority
        } else if quantity != best_quantity {
            quantity < best_quantity
        } else if best_stacked && !group.is_stackable() {
            true
        } else {
            role_needed || addons_needed
        };

        if better {
            best = Some(index);
            best_stacked = group.is_stackable();
            best_quantity = quantity;
            best_priority = priority;
            best_host_specific = host_specific;
            best_virt_only = virt_only;
        }
    }
    best
}

/// Pick groups until nothing needed remains. Groups continuing a
/// partially covered stack are taken first.
fn best_groups(
    groups: &mut [EntitlementGroup<'_>],
    needs: &mut Needs,
    compliance: &ComplianceStatus,
) -> Vec<usize> {
    let mut selected = Vec::new();

    for stack_id in compliance.partial_stacks.keys() {
        for (index, group) in groups.iter_mut().enumerate() {
            if group.is_stackable() && group.stack_id() == stack_id {
                let in_common = common_products(&needs.installed, group);
                needs.installed.retain(|p| !in_common.contains(p));
                group.set_installed(in_common);
                selected.push(index);
            }
        }
    }

    while let Some(index) = find_best_group(groups, &selected, needs) {
        let group = &mut groups[index];
        let in_common = common_products(&needs.installed, group);
        needs.installed.retain(|p| !in_common.contains(p));
        let addons = common_addons(&needs.addons, group);
        needs.addons.retain(|a| !addons.contains(a));
        if !common_role(&needs.role, group).is_empty() {
            needs.role.clear();
        }
        group.set_installed(in_common);
        debug!(stack = %group.stack_id(), "selected entitlement group");
        selected.push(index);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physical(sockets: &str) -> Consumer {
        Consumer::default().with_fact(facts::SOCKETS, sockets)
    }

    fn pool(id: &str, product: &str, quantity: i64) -> Pool {
        let mut pool = Pool::new(id, product);
        pool.quantity = quantity;
        pool
    }

    fn request(consumer: Consumer, pools: Vec<Pool>, products: &[&str]) -> AutobindRequest {
        AutobindRequest {
            consumer,
            pools,
            products: products.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_pool_selected() {
        let rules = AutobindRules::default();
        let req = request(physical("2"), vec![pool("a", "prod", 10)], &["prod"]);
        let selected = rules.select_pools(&req);
        assert_eq!(selected, BTreeMap::from([(PoolId::from("a"), 1)]));
    }

    #[test]
    fn test_nothing_needed_selects_nothing() {
        let rules = AutobindRules::default();
        let req = request(physical("2"), vec![pool("a", "prod", 10)], &["other"]);
        assert!(rules.select_pools(&req).is_empty());
    }

    #[test]
    fn test_exhausted_pool_is_skipped() {
        let rules = AutobindRules::default();
        let mut empty = pool("a", "prod", 10);
        empty.consumed = 10;
        let req = request(physical("2"), vec![empty], &["prod"]);
        assert!(rules.select_pools(&req).is_empty());
    }

    #[test]
    fn test_virt_only_pool_skipped_for_physical() {
        let rules = AutobindRules::default();
        let virt = pool("a", "prod", 10).with_product_attribute("virt_only", "true");
        let req = request(physical("2"), vec![virt], &["prod"]);
        assert!(rules.select_pools(&req).is_empty());
    }

    #[test]
    fn test_arch_mismatch_skipped() {
        let rules = AutobindRules::default();
        let consumer = physical("2").with_fact(facts::ARCH, "ppc64");
        let pool = pool("a", "prod", 10).with_product_attribute("arch", "x86_64");
        let req = request(consumer, vec![pool], &["prod"]);
        assert!(rules.select_pools(&req).is_empty());
    }

    #[test]
    fn test_requested_sla_filters_pools() {
        let rules = AutobindRules::default();
        let premium = pool("premium", "prod", 10).with_product_attribute("support_level", "Premium");
        let standard = pool("standard", "prod", 10).with_product_attribute("support_level", "Standard");
        let mut req = request(physical("2"), vec![premium, standard], &["prod"]);
        req.consumer.service_level = Some("standard".into());
        let selected = rules.select_pools(&req);
        assert_eq!(selected.keys().collect::<Vec<_>>(), vec![&PoolId::from("standard")]);
    }

    #[test]
    fn test_exempt_sla_always_valid() {
        let rules = AutobindRules::new(AutobindConfig {
            exempt_service_levels: vec!["Layered".into()],
            ..Default::default()
        });
        let layered = pool("layered", "prod", 10).with_product_attribute("support_level", "layered");
        let mut req = request(physical("2"), vec![layered], &["prod"]);
        req.consumer.service_level = Some("Premium".into());
        assert_eq!(rules.select_pools(&req).len(), 1);
    }

    #[test]
    fn test_stack_quantity_for_four_sockets() {
        let rules = AutobindRules::default();
        let stacked = pool("a", "prod", 5)
            .with_product_attribute("stacking_id", "s1")
            .with_product_attribute("multi-entitlement", "yes")
            .with_product_attribute("sockets", "2");
        let req = request(physical("4"), vec![stacked], &["prod"]);
        assert_eq!(rules.select_pools(&req), BTreeMap::from([(PoolId::from("a"), 2)]));
    }

    #[test]
    fn test_superset_pool_preferred() {
        let rules = AutobindRules::default();
        let both = pool("both", "x", 10).with_provided_product("y");
        let only_x = pool("only-x", "x", 10);
        let consumer = physical("2")
            .with_installed_product("x")
            .with_installed_product("y");
        let req = request(consumer, vec![only_x, both], &["x", "y"]);
        assert_eq!(rules.select_pools(&req), BTreeMap::from([(PoolId::from("both"), 1)]));
    }

    #[test]
    fn test_unlimited_pool_takes_what_covers() {
        let rules = AutobindRules::default();
        let unlimited = Pool::new("u", "prod")
            .with_product_attribute("stacking_id", "s1")
            .with_product_attribute("multi-entitlement", "yes")
            .with_product_attribute("sockets", "2");
        let req = request(physical("6"), vec![unlimited], &["prod"]);
        assert_eq!(rules.select_pools(&req), BTreeMap::from([(PoolId::from("u"), 3)]));
    }

    #[test]
    fn test_compliant_products_are_not_needed() {
        let rules = AutobindRules::default();
        let held = Entitlement::new("e1", pool("held", "prod", 10), 1);
        let mut compliance = ComplianceStatus::default();
        compliance.add_compliant_product(ProductId::from("prod"), &held);
        let mut req = request(physical("2"), vec![pool("a", "prod", 10)], &["prod"]);
        req.compliance = compliance;
        assert!(rules.select_pools(&req).is_empty());
    }

    #[test]
    fn test_remaining_needs() {
        let ent = Entitlement::new(
            "e1",
            pool("p", "prod", 1)
                .with_product_attribute("roles", "server")
                .with_product_attribute("addons", "ha, storage"),
            1,
        );
        let attached = vec![ent];
        assert_eq!(remaining_role(Some("server"), &attached), "");
        assert_eq!(remaining_role(Some("desktop"), &attached), "desktop");
        assert_eq!(remaining_role(None, &attached), "");
        let addons = vec!["ha".to_string(), "debug".to_string()];
        assert_eq!(remaining_addons(&addons, &attached), vec!["debug".to_string()]);
    }

    #[test]
    fn test_attached_entitlements_are_deduplicated() {
        let ent = Entitlement::new("e1", pool("p", "prod", 1), 1);
        let mut compliance = ComplianceStatus::default();
        compliance.add_compliant_product(ProductId::from("a"), &ent);
        compliance.add_compliant_product(ProductId::from("b"), &ent);
        assert_eq!(attached_entitlements(&compliance).len(), 1);
    }
}
