//! JSON request envelopes for each rule entry point.
//!
//! Envelopes use the host's camelCase field names. Parsing goes through
//! [`from_json`](ComplianceRequest::from_json), which also rejects
//! snapshots that break structural invariants the rules rely on.

use candlepin_core::error::AppError;
use candlepin_core::result::AppResult;
use candlepin_core::types::{CallerType, StackId};
use candlepin_entity::serde_util;
use candlepin_entity::{ActivationKey, ComplianceStatus, Consumer, Entitlement, GuestId, Pool};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Parse an envelope and run its invariant checks.
fn parse<T: DeserializeOwned>(json: &str, check: impl FnOnce(&T) -> AppResult<()>) -> AppResult<T> {
    let request: T = serde_json::from_str(json)?;
    check(&request)?;
    Ok(request)
}

fn check_entitlements(entitlements: &[Entitlement]) -> AppResult<()> {
    for ent in entitlements {
        if ent.ends() < ent.starts() {
            return Err(AppError::validation(format!(
                "Entitlement {} ends before it starts",
                ent.id.as_ref().map(|id| id.as_str()).unwrap_or("<unsaved>")
            )));
        }
        if ent.quantity < 0 {
            return Err(AppError::validation(format!(
                "Entitlement {} has a negative quantity",
                ent.id.as_ref().map(|id| id.as_str()).unwrap_or("<unsaved>")
            )));
        }
    }
    Ok(())
}

fn check_pool(pool: &Pool) -> AppResult<()> {
    if pool.end_date < pool.start_date {
        return Err(AppError::validation(format!(
            "Pool {} ends before it starts",
            pool.id
        )));
    }
    Ok(())
}

/// Owner of the consumer, as far as the rules care.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub default_service_level: Option<String>,
}

/// Compliance status request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRequest {
    pub consumer: Consumer,
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub entitlements: Vec<Entitlement>,
    /// Date to evaluate on; defaults to now.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub ondate: Option<DateTime<Utc>>,
    #[serde(default)]
    pub calculate_compliant_until: Option<bool>,
    #[serde(default)]
    pub calculate_product_compliance_date_ranges: Option<bool>,
    /// Guest list that replaces the consumer's own when present.
    #[serde(default)]
    pub guest_ids: Option<Vec<GuestId>>,
    /// Stack to probe with `is_stack_compliant`.
    #[serde(default)]
    pub stack_id: Option<StackId>,
    /// Entitlement to probe with `is_ent_compliant`.
    #[serde(default)]
    pub entitlement: Option<Entitlement>,
}

impl ComplianceRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let mut request: Self = parse(json, |r: &Self| {
            check_entitlements(&r.entitlements)?;
            if let Some(ent) = &r.entitlement {
                check_entitlements(std::slice::from_ref(ent))?;
            }
            Ok(())
        })?;
        if let Some(guests) = request.guest_ids.take() {
            request.consumer.guest_ids = guests;
        }
        Ok(request)
    }

    pub fn ondate(&self) -> DateTime<Utc> {
        self.ondate.unwrap_or_else(Utc::now)
    }
}

/// Auto-bind pool selection request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutobindRequest {
    pub consumer: Consumer,
    /// Candidate pools.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub pools: Vec<Pool>,
    /// Product ids the consumer needs covered.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub products: Vec<String>,
    /// The consumer's current compliance status.
    #[serde(default)]
    pub compliance: ComplianceStatus,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub service_level_override: Option<String>,
    /// Service levels that never restrict pool choice.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub exempt_list: Vec<String>,
    /// Look at derived products, for hosts binding on behalf of guests.
    #[serde(default)]
    pub consider_derived: bool,
}

impl AutobindRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        parse(json, |r: &Self| {
            for pool in &r.pools {
                check_pool(pool)?;
            }
            Ok(())
        })
    }

    /// The service level to honour: the override, else the consumer's,
    /// else the owner default. Empty values count as unset.
    pub fn requested_service_level(&self) -> Option<&str> {
        self.service_level_override
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.consumer.service_level.as_deref().filter(|s| !s.is_empty()))
            .or_else(|| {
                self.owner
                    .as_ref()
                    .and_then(|o| o.default_service_level.as_deref())
                    .filter(|s| !s.is_empty())
            })
    }
}

/// A pool with the quantity requested from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolQuantity {
    pub pool: Pool,
    pub quantity: i64,
}

/// Pre-entitlement validation request for one or many pools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub consumer: Consumer,
    /// The host the consumer runs on, when known.
    #[serde(default)]
    pub host_consumer: Option<Consumer>,
    #[serde(default)]
    pub pool: Option<Pool>,
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub pools: Vec<Pool>,
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub pool_quantities: Vec<PoolQuantity>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub caller: CallerType,
    /// Entitlements the consumer already holds.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub consumer_entitlements: Vec<Entitlement>,
}

fn default_quantity() -> i64 {
    1
}

impl ValidationRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        parse(json, |r: &Self| {
            if r.quantity < 0 {
                return Err(AppError::validation("Requested quantity must not be negative"));
            }
            if let Some(pq) = r.pool_quantities.iter().find(|pq| pq.quantity < 0) {
                return Err(AppError::validation(format!(
                    "Requested quantity for pool {} must not be negative",
                    pq.pool.id
                )));
            }
            check_entitlements(&r.consumer_entitlements)
        })
    }

    /// The single pool to validate.
    pub fn require_pool(&self) -> AppResult<&Pool> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::validation("Request carries no 'pool'"))
    }
}

/// Suggested quantity request for one or many pools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRequest {
    pub consumer: Consumer,
    #[serde(default)]
    pub pool: Option<Pool>,
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub pools: Vec<Pool>,
    /// Entitlements already held that count towards the stack.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub valid_entitlements: Vec<Entitlement>,
}

impl QuantityRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        parse(json, |r: &Self| check_entitlements(&r.valid_entitlements))
    }

    pub fn require_pool(&self) -> AppResult<&Pool> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::validation("Request carries no 'pool'"))
    }
}

/// Pool type request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolTypeRequest {
    pub pool: Pool,
}

impl PoolTypeRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        parse(json, |r: &Self| check_pool(&r.pool))
    }
}

/// Request to add a pool to an activation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationKeyRequest {
    pub key: ActivationKey,
    pub pool: Pool,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ActivationKeyRequest {
    pub fn from_json(json: &str) -> AppResult<Self> {
        parse(json, |_: &Self| Ok(()))
    }
}
