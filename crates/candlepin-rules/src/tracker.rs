//! Accumulates what a stack (or a single entitlement) provides.
//!
//! A tracker starts empty and grows as pools or entitlements are added to
//! it. Every compliance attribute that a contributing product declares is
//! accumulated with its own strategy; an attribute the tracker holds a value
//! for is said to be *enforced* and is later checked by the coverage
//! calculator.

use std::collections::BTreeMap;

use candlepin_core::types::attribute::names;
use candlepin_core::types::{EntitlementId, ProductAttribute, StackId};
use candlepin_core::util::{parse_int, split_list};
use candlepin_entity::{Consumer, Entitlement, Pool, ReasonSource};
use tracing::{debug, trace};

/// A value accumulated for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulatedValue {
    /// A summed capacity. `-1` means unlimited for the guest limit.
    Quantity(i64),
    /// Collected arch strings, roles or add-ons.
    Values(Vec<String>),
}

impl AccumulatedValue {
    pub fn quantity(&self) -> Option<i64> {
        match self {
            Self::Quantity(q) => Some(*q),
            Self::Values(_) => None,
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Self::Values(v) => v,
            Self::Quantity(_) => &[],
        }
    }

    /// Render the value for a reason attribute.
    pub fn render(&self) -> String {
        match self {
            Self::Quantity(q) => q.to_string(),
            Self::Values(v) => v.join(","),
        }
    }
}

/// What a tracker accumulates for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerKind {
    /// Every entitlement sharing a stacking id.
    Stack(StackId),
    /// One entitlement. The id is taken from the first entitlement added.
    Entitlement(Option<EntitlementId>),
}

/// Accumulated coverage state for a stack or a single entitlement.
#[derive(Debug, Clone)]
pub struct ComplianceTracker<'c> {
    consumer: &'c Consumer,
    kind: TrackerKind,
    entitlement_ids: Vec<EntitlementId>,
    host_restricted: Option<String>,
    accumulated: BTreeMap<ProductAttribute, AccumulatedValue>,
    empty: bool,
}

impl<'c> ComplianceTracker<'c> {
    pub fn new(consumer: &'c Consumer, kind: TrackerKind) -> Self {
        Self {
            consumer,
            kind,
            entitlement_ids: Vec::new(),
            host_restricted: None,
            accumulated: BTreeMap::new(),
            empty: true,
        }
    }

    pub fn for_stack(consumer: &'c Consumer, stack_id: StackId) -> Self {
        Self::new(consumer, TrackerKind::Stack(stack_id))
    }

    pub fn for_entitlement(consumer: &'c Consumer) -> Self {
        Self::new(consumer, TrackerKind::Entitlement(None))
    }

    /// A tracker for the pool's stack that enforces every attribute the
    /// pool declares but has nothing accumulated yet.
    pub fn from_pool(pool: &Pool, consumer: &'c Consumer) -> Self {
        let mut tracker = Self::for_stack(consumer, pool.stacking_id().unwrap_or_default());
        tracker.update_from_pool(pool, 0);
        tracker
    }

    pub fn consumer(&self) -> &'c Consumer {
        self.consumer
    }

    pub fn kind(&self) -> &TrackerKind {
        &self.kind
    }

    /// Whether nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_host_restricted(&self) -> bool {
        self.host_restricted.is_some()
    }

    /// The id reasons generated for this tracker refer to.
    pub fn reason_source(&self) -> ReasonSource {
        match &self.kind {
            TrackerKind::Stack(id) => ReasonSource::Stack(id.clone()),
            TrackerKind::Entitlement(id) => ReasonSource::Entitlement(id.clone()),
        }
    }

    /// Whether the attribute is checked for this tracker.
    ///
    /// Guests drawing from a host-restricted pool are not held to RAM or
    /// vCPU limits.
    pub fn enforces(&self, attr: ProductAttribute) -> bool {
        if self.host_restricted.is_some()
            && self.consumer.is_guest()
            && attr.unchecked_when_host_restricted()
        {
            trace!(attribute = %attr, "not enforcing: guest on host restricted pool");
            return false;
        }
        self.accumulated.contains_key(&attr)
    }

    pub fn accumulated(&self, attr: ProductAttribute) -> Option<&AccumulatedValue> {
        self.accumulated.get(&attr)
    }

    /// Accumulate `quantity` entitlements from `pool` without an actual
    /// entitlement. A quantity of zero only marks the pool's attributes as
    /// enforced.
    pub fn update_from_pool(&mut self, pool: &Pool, quantity: i64) {
        if quantity > 0 {
            self.empty = false;
        }
        if let Some(host) = pool.attribute(names::REQUIRES_HOST) {
            self.host_restricted = Some(host.to_string());
        }

        for &attr in ProductAttribute::for_consumer(self.consumer.is_guest()) {
            let Some(pool_value) = pool.product_attribute(attr.as_str()) else {
                continue;
            };
            let current = if self.enforces(attr) {
                self.accumulated.remove(&attr)
            } else {
                None
            };
            let next = accumulate(attr, current, pool_value, pool, quantity);
            trace!(attribute = %attr, value = %next.render(), "accumulated");
            self.accumulated.insert(attr, next);
        }
    }

    /// Add an entitlement. Each entitlement id is only counted once, and
    /// non-stacked entitlements count as quantity 1.
    pub fn update_from_entitlement(&mut self, ent: &Entitlement) {
        if let TrackerKind::Entitlement(id @ None) = &mut self.kind {
            if self.entitlement_ids.is_empty() {
                *id = ent.id.clone();
            }
        }

        if let Some(ent_id) = &ent.id {
            if self.entitlement_ids.contains(ent_id) {
                debug!(entitlement = %ent_id, "entitlement already tracked");
                return;
            }
            self.entitlement_ids.push(ent_id.clone());
        }
        self.empty = false;

        let quantity = if !ent.is_stacked() && ent.quantity > 1 {
            1
        } else {
            ent.quantity
        };
        self.update_from_pool(&ent.pool, quantity);
    }
}

fn accumulate(
    attr: ProductAttribute,
    current: Option<AccumulatedValue>,
    pool_value: &str,
    pool: &Pool,
    quantity: i64,
) -> AccumulatedValue {
    let current_quantity = current.as_ref().and_then(AccumulatedValue::quantity).unwrap_or(0);
    let mut current_values = match current {
        Some(AccumulatedValue::Values(v)) => v,
        _ => Vec::new(),
    };
    let per_unit = parse_int(pool_value).unwrap_or(0);

    match attr {
        ProductAttribute::Arch => {
            current_values.push(pool_value.to_string());
            AccumulatedValue::Values(current_values)
        }
        ProductAttribute::Role | ProductAttribute::Addons => {
            current_values.extend(split_list(pool_value));
            AccumulatedValue::Values(current_values)
        }
        ProductAttribute::GuestLimit => AccumulatedValue::Quantity(-1),
        ProductAttribute::Sockets => {
            let multiplier = pool
                .product_attribute_int(names::INSTANCE_MULTIPLIER)
                .filter(|m| *m > 0)
                .unwrap_or(1);
            // Only whole multiples of the instance multiplier count.
            let adjusted = quantity - quantity % multiplier;
            AccumulatedValue::Quantity(current_quantity + per_unit * adjusted / multiplier)
        }
        ProductAttribute::Cores
        | ProductAttribute::Ram
        | ProductAttribute::Vcpu
        | ProductAttribute::StorageBand => {
            AccumulatedValue::Quantity(current_quantity + per_unit * quantity)
        }
    }
}
