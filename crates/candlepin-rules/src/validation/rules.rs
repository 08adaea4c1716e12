//! Entry points for pre-entitlement validation.

use std::collections::BTreeMap;

use candlepin_core::AppResult;
use candlepin_core::config::ComplianceConfig;
use candlepin_core::types::PoolId;
use candlepin_entity::Pool;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::checks::Check;
use super::context::ValidationContext;
use super::result::ValidationResult;
use crate::request::ValidationRequest;

/// Validates pools before they are bound, listed or auto-attached.
#[derive(Debug, Clone)]
pub struct EntitlementRules {
    newborn_window: Duration,
}

impl Default for EntitlementRules {
    fn default() -> Self {
        Self::new(&ComplianceConfig::default())
    }
}

impl EntitlementRules {
    pub fn new(config: &ComplianceConfig) -> Self {
        Self {
            newborn_window: config.newborn_window(),
        }
    }

    /// Validate the request's single pool at the requested quantity.
    pub fn validate_pool(
        &self,
        request: &ValidationRequest,
        now: DateTime<Utc>,
    ) -> AppResult<ValidationResult> {
        let pool = request.require_pool()?;
        let result = self.evaluate(request, pool, request.quantity, now);
        info!(
            pool_id = %pool.id,
            caller = request.caller.as_str(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated pool"
        );
        Ok(result)
    }

    /// Validate each pool at its own requested quantity.
    pub fn validate_pools_batch(
        &self,
        request: &ValidationRequest,
        now: DateTime<Utc>,
    ) -> BTreeMap<PoolId, ValidationResult> {
        let results: BTreeMap<PoolId, ValidationResult> = request
            .pool_quantities
            .iter()
            .map(|pq| {
                let result = self.evaluate(request, &pq.pool, pq.quantity, now);
                (pq.pool.id.clone(), result)
            })
            .collect();
        info!(pools = results.len(), caller = request.caller.as_str(), "validated pool batch");
        results
    }

    /// Validate every pool at quantity 1, as when listing available pools.
    pub fn validate_pools_list(
        &self,
        request: &ValidationRequest,
        now: DateTime<Utc>,
    ) -> BTreeMap<PoolId, ValidationResult> {
        let results: BTreeMap<PoolId, ValidationResult> = request
            .pools
            .iter()
            .map(|pool| (pool.id.clone(), self.evaluate(request, pool, 1, now)))
            .collect();
        info!(pools = results.len(), "validated pool list");
        results
    }

    fn evaluate(
        &self,
        request: &ValidationRequest,
        pool: &Pool,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> ValidationResult {
        let ctx = ValidationContext {
            consumer: &request.consumer,
            host_consumer: request.host_consumer.as_ref(),
            pool,
            quantity,
            caller: request.caller,
            entitlements: &request.consumer_entitlements,
            now,
            newborn_window: self.newborn_window,
        };

        let mut result = ValidationResult::default();
        for check in Check::for_pool(pool) {
            check.run(&ctx, &mut result);
        }
        if result.has_errors() {
            debug!(pool_id = %pool.id, errors = ?result.errors, "pool failed validation");
        }
        result
    }
}
