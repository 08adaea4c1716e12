//! Entitlement groups: a single pool, or every candidate pool sharing a
//! stacking id, treated uniformly while choosing what to bind.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use candlepin_core::types::{PoolId, ProductAttribute, ProductId, StackId, SyspurposeAttribute};
use candlepin_entity::{Consumer, Entitlement, Pool};
use tracing::debug;

use super::priority::prefer_pool;
use crate::compliance::{entitlement_coverage, stack_coverage_of};
use crate::coverage::increment_for;

/// A pool considered for binding.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub pool: Pool,
    /// How many entitlements may be taken from the pool.
    pub currently_available: i64,
    /// Score from [`pool_priority`](super::priority::pool_priority).
    pub priority: f64,
}

impl Candidate {
    /// The entitlement taking everything currently available.
    pub fn mock_entitlement(&self) -> Entitlement {
        Entitlement::hypothetical(&self.pool, self.currently_available)
    }

    fn has_value(&self, attr: &str) -> bool {
        self.pool
            .product_attribute(attr)
            .is_some_and(|v| !v.is_empty())
    }

    fn matches_role(&self, role: &str) -> bool {
        !role.is_empty()
            && self
                .pool
                .syspurpose_values(SyspurposeAttribute::Roles)
                .iter()
                .any(|r| r == role)
    }

    fn matches_addon(&self, addons: &[String]) -> bool {
        self.pool
            .syspurpose_values(SyspurposeAttribute::Addons)
            .iter()
            .any(|a| addons.contains(a))
    }

    fn stack_score(&self) -> f64 {
        let mut score = 0.0;
        if self.pool.is_virt_only() {
            score += 100.0;
        }
        if self.pool.is_host_specific() {
            score += 150.0;
        }
        score
    }
}

/// Pools that are bound together to cover the consumer.
#[derive(Debug)]
pub struct EntitlementGroup<'a> {
    consumer: &'a Consumer,
    stackable: bool,
    stack_id: StackId,
    pools: Vec<&'a Candidate>,
    /// Products this group may be credited with.
    installed: Vec<ProductId>,
    attached: &'a [Entitlement],
    consider_derived: bool,
    quantities: OnceCell<BTreeMap<PoolId, i64>>,
    average_priority: OnceCell<f64>,
}

impl<'a> EntitlementGroup<'a> {
    pub fn new(
        consumer: &'a Consumer,
        stack_id: Option<StackId>,
        installed: Vec<ProductId>,
        attached: &'a [Entitlement],
        consider_derived: bool,
    ) -> Self {
        Self {
            consumer,
            stackable: stack_id.is_some(),
            stack_id: stack_id.unwrap_or_default(),
            pools: Vec::new(),
            installed,
            attached,
            consider_derived,
            quantities: OnceCell::new(),
            average_priority: OnceCell::new(),
        }
    }

    pub fn add_pool(&mut self, candidate: &'a Candidate) {
        self.pools.push(candidate);
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    pub fn stack_id(&self) -> &StackId {
        &self.stack_id
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter().map(|c| &c.pool)
    }

    pub fn set_installed(&mut self, installed: Vec<ProductId>) {
        self.installed = installed;
    }

    /// Whether any already attached entitlement belongs to this stack.
    pub fn extends_attached_stack(&self) -> bool {
        self.stackable
            && self
                .attached
                .iter()
                .any(|e| e.pool.stacking_id().as_ref() == Some(&self.stack_id))
    }

    fn entitlements_for(&self, pools: &[&Candidate]) -> Vec<Entitlement> {
        pools.iter().map(|c| c.mock_entitlement()).collect()
    }

    fn with_attached(&self, mut ents: Vec<Entitlement>) -> Vec<Entitlement> {
        ents.extend(self.attached.iter().cloned());
        ents
    }

    fn stack_covered(&self, pools: &[&Candidate]) -> bool {
        let ents = self.with_attached(self.entitlements_for(pools));
        stack_coverage_of(self.consumer, &self.stack_id, &ents).covered
    }

    /// Whether the group, fully consumed and combined with what is already
    /// attached, covers the consumer.
    ///
    /// A stack failing on some attribute drops the pools that declare it
    /// and tries again. A stack failing on arch can never recover.
    pub fn validate(&mut self) -> bool {
        let all = self.with_attached(self.entitlements_for(&self.pools));
        let Some(first) = all.first() else {
            debug!("no entitlements");
            return false;
        };

        if !self.stackable {
            return entitlement_coverage(self.consumer, first, &all).covered;
        }

        let coverage = stack_coverage_of(self.consumer, &self.stack_id, &all);
        if coverage.covered {
            return true;
        }
        debug!(stack = %self.stack_id, "stack is partial with all entitlements stacked");

        let mut failing = Vec::new();
        for reason in &coverage.reasons {
            let key = reason.attribute_key();
            if key == ProductAttribute::Arch.as_str() {
                debug!(stack = %self.stack_id, "stack contains an arch mismatch");
                return false;
            }
            failing.push(key);
        }
        self.pools
            .retain(|c| !failing.iter().any(|attr| c.has_value(attr)));
        if self.pools.is_empty() {
            return false;
        }
        self.stack_covered(&self.pools)
    }

    /// Installed products the given pools provide, without repeats.
    fn provided_by(&self, pools: &[&Candidate]) -> Vec<ProductId> {
        let mut provided: Vec<ProductId> = Vec::new();
        for candidate in pools {
            let pool = &candidate.pool;
            let products = if self.consider_derived && pool.has_derived() {
                pool.derived_products()
            } else {
                pool.products()
            };
            for product_id in products {
                if !provided.contains(product_id) && self.installed.contains(product_id) {
                    provided.push(product_id.clone());
                }
            }
        }
        provided
    }

    pub fn provided_products(&self) -> Vec<ProductId> {
        self.provided_by(&self.pools)
    }

    pub fn addons(&self) -> Vec<String> {
        self.pools
            .iter()
            .flat_map(|c| c.pool.syspurpose_values(SyspurposeAttribute::Addons))
            .collect()
    }

    pub fn roles(&self) -> Vec<String> {
        self.pools
            .iter()
            .flat_map(|c| c.pool.syspurpose_values(SyspurposeAttribute::Roles))
            .collect()
    }

    pub fn num_host_specific(&self) -> usize {
        self.pools.iter().filter(|c| c.pool.is_host_specific()).count()
    }

    pub fn num_virt_only(&self) -> usize {
        self.pools.iter().filter(|c| c.pool.is_virt_only()).count()
    }

    /// Attributes used by the group's pools that stacks accumulate on,
    /// excluding arch.
    fn stacking_attributes(&self, limit: usize) -> Vec<ProductAttribute> {
        ProductAttribute::for_consumer(self.consumer.is_guest())
            .iter()
            .copied()
            .filter(|a| *a != ProductAttribute::Arch)
            .filter(|a| self.pools.iter().any(|c| c.pool.has_product_attribute(a.as_str())))
            .take(limit)
            .collect()
    }

    /// Drop parallel stacks: when the stack stays compliant without every
    /// pool enforcing some subset of its attributes, prefer the smaller
    /// variant with the best per-pool score.
    ///
    /// Pools carrying a needed role or add-on are never dropped.
    pub fn remove_extra_attrs(&mut self, role: &str, addons: &[String], max_attributes: usize) {
        if !self.stackable {
            return;
        }
        let original_provided = self.provided_products().len();
        let attrs = self.stacking_attributes(max_attributes);
        debug!(stack = %self.stack_id, attributes = ?attrs, "group stacks on attributes");

        let mut variants: Vec<Vec<&'a Candidate>> = vec![self.pools.clone()];
        let n = attrs.len();
        for mask in 1u32..(1u32 << n) {
            if mask.count_ones() as usize >= n {
                continue;
            }
            let removed: Vec<&str> = attrs
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, a)| a.as_str())
                .collect();

            let without: Vec<&'a Candidate> = self
                .pools
                .iter()
                .copied()
                .filter(|c| {
                    !removed.iter().any(|attr| c.has_value(attr))
                        || c.matches_role(role)
                        || c.matches_addon(addons)
                })
                .collect();
            if without.is_empty() || without.len() == self.pools.len() {
                continue;
            }
            if self.stack_covered(&without) && self.provided_by(&without).len() == original_provided {
                variants.push(without);
            }
        }

        let mut best = 0;
        let mut best_priority = 0.0;
        let mut best_len = self.pools.len();
        for (i, variant) in variants.iter().enumerate() {
            let priority =
                variant.iter().map(|c| c.stack_score()).sum::<f64>() / variant.len() as f64;
            if priority > best_priority || (priority == best_priority && variant.len() < best_len) {
                best = i;
                best_priority = priority;
                best_len = variant.len();
            }
        }
        if best != 0 {
            debug!(stack = %self.stack_id, before = self.pools.len(), after = best_len, "removed parallel stack");
        }
        self.pools = variants.swap_remove(best);
    }

    fn compare_for_pruning(a: &Candidate, b: &Candidate) -> Ordering {
        let mut priority_a = a.priority;
        let mut priority_b = b.priority;
        match a.pool.end_date.cmp(&b.pool.end_date) {
            Ordering::Greater => priority_b += 1.0,
            Ordering::Less => priority_a += 1.0,
            Ordering::Equal => {}
        }
        priority_b.total_cmp(&priority_a).then_with(|| {
            if prefer_pool(&a.pool, &b.pool) {
                Ordering::Less
            } else if prefer_pool(&b.pool, &a.pool) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
    }

    /// Remove every pool the stack can do without, lowest priority first.
    pub fn prune_pools(&mut self, role: &str, addons: &[String]) {
        if !self.stackable {
            return;
        }
        self.pools.sort_by(|a, b| Self::compare_for_pruning(a, b));

        let before = self.pools.len();
        let provided = self.provided_products().len();
        for i in (0..self.pools.len()).rev() {
            let candidate = self.pools.remove(i);
            let needed = self.pools.is_empty()
                || !self.stack_covered(&self.pools)
                || self.provided_products().len() != provided
                || candidate.matches_role(role)
                || candidate.matches_addon(addons);
            if needed {
                self.pools.push(candidate);
            }
        }
        debug!(stack = %self.stack_id, removed = before - self.pools.len(), of = before, "pruned pools");
    }

    /// Quantity to bind from each pool, found by raising each pool's
    /// quantity in turn until the group covers the consumer.
    ///
    /// Only meaningful once the group has been pruned.
    pub fn pool_quantities(&self) -> &BTreeMap<PoolId, i64> {
        self.quantities.get_or_init(|| {
            let mut result = BTreeMap::new();
            let mut ents = self.entitlements_for(&self.pools);
            for (i, candidate) in self.pools.iter().enumerate() {
                let increment = increment_for(&candidate.pool, self.consumer);
                let mut quantity = increment;
                while quantity <= candidate.currently_available {
                    ents[i].quantity = quantity;
                    let all = self.with_attached(ents.clone());
                    let covered = if self.stackable {
                        stack_coverage_of(self.consumer, &self.stack_id, &all).covered
                    } else {
                        entitlement_coverage(self.consumer, &ents[i], &all).covered
                    };
                    if covered {
                        result.insert(candidate.pool.id.clone(), quantity);
                        break;
                    }
                    quantity += increment;
                }
            }
            result
        })
    }

    pub fn total_quantity(&self) -> i64 {
        self.pool_quantities().values().sum()
    }

    /// Mean pool priority. Only meaningful once the group has been pruned.
    pub fn average_priority(&self) -> f64 {
        *self.average_priority.get_or_init(|| {
            if self.pools.is_empty() {
                return 0.0;
            }
            self.pools.iter().map(|c| c.priority).sum::<f64>() / self.pools.len() as f64
        })
    }
}
