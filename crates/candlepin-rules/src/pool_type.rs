//! Classification of pools for display.

use std::fmt;

use candlepin_core::types::attribute::names;
use candlepin_entity::Pool;
use serde::{Deserialize, Serialize};

/// How a pool is consumed, derived from stacking, multi-entitlement and
/// instance-multiplier attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolType {
    #[serde(rename = "instance based")]
    InstanceBased,
    #[serde(rename = "stackable")]
    Stackable,
    #[serde(rename = "multi entitlement")]
    MultiEntitlement,
    #[serde(rename = "unique stackable")]
    UniqueStackable,
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "unknown")]
    Unknown,
}

impl PoolType {
    pub fn of(pool: &Pool) -> Self {
        let stacking = pool.has_product_attribute(names::STACKING_ID);
        let multi_ent = pool.is_multi_ent();

        // Instance based pools that cannot stack have no display type.
        if pool.has_product_attribute(names::INSTANCE_MULTIPLIER) {
            return if stacking && multi_ent {
                Self::InstanceBased
            } else {
                Self::Unknown
            };
        }

        match (stacking, multi_ent) {
            (true, true) => Self::Stackable,
            (false, true) => Self::MultiEntitlement,
            (true, false) => Self::UniqueStackable,
            (false, false) => Self::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceBased => "instance based",
            Self::Stackable => "stackable",
            Self::MultiEntitlement => "multi entitlement",
            Self::UniqueStackable => "unique stackable",
            Self::Standard => "standard",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The pool type as returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolTypeResult {
    pub raw_pool_type: PoolType,
}

impl From<&Pool> for PoolTypeResult {
    fn from(pool: &Pool) -> Self {
        Self {
            raw_pool_type: PoolType::of(pool),
        }
    }
}
