//! Activation keys and the consumer profile their pools imply.

use candlepin_core::types::attribute::names;
use candlepin_core::util::parse_int;
use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::serde_util;

/// A pool attached to an activation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationKeyPool {
    pub pool: Pool,
    /// Quantity to bind on registration; `None` lets the host decide.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// An activation key snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationKey {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub pools: Vec<ActivationKeyPool>,
}

/// The kind of consumer a key's pools restrict registration to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyProfile {
    /// Some pool is physical only.
    pub physical_only: bool,
    /// Some pool is virt only, host restricted, or needs more instances
    /// than the key binds.
    pub virt_only: bool,
    /// Host the key's guests must run on.
    pub requires_host: Option<String>,
    /// Consumer type the key's pools require.
    pub consumer_type: Option<String>,
}

impl ActivationKey {
    /// Derive the consumer profile implied by the key's pools.
    pub fn profile(&self) -> KeyProfile {
        let mut profile = KeyProfile::default();
        for entry in &self.pools {
            let pool = &entry.pool;
            profile.physical_only |= pool.is_flag_set(names::PHYSICAL_ONLY);

            let under_instanced = match (
                pool.attribute(names::INSTANCE_MULTIPLIER).and_then(parse_int),
                entry.quantity,
            ) {
                (Some(multiplier), Some(quantity)) => multiplier > quantity,
                _ => false,
            };
            profile.virt_only |= pool.is_flag_set(names::VIRT_ONLY) || under_instanced;

            if let Some(host) = pool.attribute(names::REQUIRES_HOST).filter(|h| !h.is_empty()) {
                profile.requires_host = Some(host.to_string());
                profile.virt_only = true;
            }
            if let Some(kind) = pool
                .attribute(names::REQUIRES_CONSUMER_TYPE)
                .filter(|t| !t.is_empty())
            {
                profile.consumer_type = Some(kind.to_string());
            }
        }
        profile
    }

    /// Whether the key already carries the given pool.
    pub fn contains_pool(&self, pool_id: &str) -> bool {
        self.pools.iter().any(|p| p.pool.id == pool_id)
    }
}
