//! A consumer's claim on a quantity of a pool.

use candlepin_core::types::EntitlementId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::serde_util;

/// An entitlement snapshot. The rules only read entitlements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Entitlement identifier. Hypothetical entitlements built during
    /// auto-bind have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntitlementId>,
    /// The pool the entitlement was drawn from.
    pub pool: Pool,
    /// Quantity consumed.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Start of the entitlement window; defaults to the pool start.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    /// End of the entitlement window; defaults to the pool end.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_quantity() -> i64 {
    1
}

impl Entitlement {
    /// Create an entitlement spanning its pool's dates.
    pub fn new(id: impl Into<EntitlementId>, pool: Pool, quantity: i64) -> Self {
        Self {
            id: Some(id.into()),
            pool,
            quantity,
            start_date: None,
            end_date: None,
        }
    }

    /// The entitlement that binding `quantity` from `pool` would create.
    pub fn hypothetical(pool: &Pool, quantity: i64) -> Self {
        Self {
            id: None,
            pool: pool.clone(),
            quantity,
            start_date: Some(pool.start_date),
            end_date: Some(pool.end_date),
        }
    }

    pub fn starts(&self) -> DateTime<Utc> {
        self.start_date.unwrap_or(self.pool.start_date)
    }

    pub fn ends(&self) -> DateTime<Utc> {
        self.end_date.unwrap_or(self.pool.end_date)
    }

    /// Whether `date` falls inside the entitlement window, inclusive.
    pub fn is_active_on(&self, date: DateTime<Utc>) -> bool {
        self.starts() <= date && date <= self.ends()
    }

    pub fn is_stacked(&self) -> bool {
        self.pool.is_stacked()
    }

    /// Set explicit start and end dates.
    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}
