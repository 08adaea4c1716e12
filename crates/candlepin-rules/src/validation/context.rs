//! Everything a pre-entitlement check may look at.

use candlepin_core::types::CallerType;
use candlepin_entity::{Consumer, Entitlement, Pool};
use chrono::{DateTime, Duration, Utc};

/// One pool being validated for one consumer.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub consumer: &'a Consumer,
    pub host_consumer: Option<&'a Consumer>,
    pub pool: &'a Pool,
    /// Quantity the caller wants to bind.
    pub quantity: i64,
    pub caller: CallerType,
    /// Entitlements the consumer already holds.
    pub entitlements: &'a [Entitlement],
    pub now: DateTime<Utc>,
    /// How long after registration a consumer may use unmapped-guest pools.
    pub newborn_window: Duration,
}

impl ValidationContext<'_> {
    /// Whether the consumer already holds an entitlement from `pool_id`.
    pub fn has_entitlement(&self, pool_id: &str) -> bool {
        self.entitlements.iter().any(|e| e.pool.id == pool_id)
    }

    /// Pool attribute, falling back to the product when the pool level is
    /// absent or blank.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.pool
            .attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.effective_value())
            .filter(|v| !v.is_empty())
            .or_else(|| self.pool.product_attribute(name))
    }

    pub fn is_binding(&self) -> bool {
        self.caller.is_binding()
    }
}
