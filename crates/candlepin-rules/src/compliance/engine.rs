//! Per-date compliance evaluation.

use candlepin_core::config::ComplianceConfig;
use candlepin_core::types::{ProductId, StackId};
use candlepin_entity::{ComplianceReason, ComplianceStatus, Consumer, Entitlement};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{entitlement_coverage, is_unmapped_guest, stack_coverage_of};

/// Computes compliance statuses.
#[derive(Debug, Clone, Default)]
pub struct ComplianceRules {
    config: ComplianceConfig,
}

impl ComplianceRules {
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    /// Full status for `on`, including the compliant-until date and the
    /// product date ranges when requested (falling back to configuration).
    pub fn get_status(
        &self,
        consumer: &Consumer,
        entitlements: &[Entitlement],
        on: DateTime<Utc>,
        calculate_compliant_until: Option<bool>,
        calculate_date_ranges: Option<bool>,
    ) -> ComplianceStatus {
        let calculate_compliant_until =
            calculate_compliant_until.unwrap_or(self.config.calculate_compliant_until);
        let calculate_date_ranges =
            calculate_date_ranges.unwrap_or(self.config.calculate_product_date_ranges);

        let mut status = self.status_on_date(consumer, entitlements, on);

        if status.is_compliant() && calculate_compliant_until && !entitlements.is_empty() {
            status.compliant_until = self.compliant_until(consumer, entitlements, on);
        }
        if status.is_partially_compliant() && calculate_date_ranges && !entitlements.is_empty() {
            let ranges = self.product_date_ranges(consumer, entitlements, on, &status);
            status.product_compliance_date_ranges = Some(ranges);
        }

        info!(
            consumer = %consumer.uuid,
            status = ?status.status,
            compliant = status.compliant_products.len(),
            partial = status.partially_compliant_products.len(),
            non_compliant = status.non_compliant_products.len(),
            "compliance status computed"
        );
        status
    }

    /// Status of the consumer on `on`, considering only entitlements
    /// active that day.
    pub fn status_on_date(
        &self,
        consumer: &Consumer,
        entitlements: &[Entitlement],
        on: DateTime<Utc>,
    ) -> ComplianceStatus {
        debug!(consumer = %consumer.uuid, %on, "checking compliance status");
        let mut status = ComplianceStatus::on(on);

        let active: Vec<Entitlement> = entitlements
            .iter()
            .filter(|e| e.is_active_on(on))
            .cloned()
            .collect();

        let mut compliant_stacks: Vec<StackId> = Vec::new();
        let mut non_compliant_stacks: Vec<StackId> = Vec::new();

        for ent in &active {
            let relevant = relevant_products(ent, consumer);
            let stacked = ent.is_stacked();
            let mut partially_stacked = false;

            if stacked {
                let stack_id = ent.pool.stacking_id().unwrap_or_default();
                if non_compliant_stacks.contains(&stack_id) {
                    partially_stacked = true;
                    status.add_partial_stack(stack_id, ent);
                } else if !compliant_stacks.contains(&stack_id) {
                    let coverage = stack_coverage_of(consumer, &stack_id, &active);
                    if coverage.covered {
                        debug!(stack = %stack_id, "stack is compliant");
                        compliant_stacks.push(stack_id);
                    } else {
                        debug!(stack = %stack_id, "stack is non-compliant");
                        partially_stacked = true;
                        status.add_partial_stack(stack_id.clone(), ent);
                        non_compliant_stacks.push(stack_id);
                        status.add_reasons(coverage.reasons);
                    }
                }
            }

            // An entitlement covering no installed product still makes the
            // consumer partial when it does not cover the system.
            if relevant.is_empty() && !stacked {
                let coverage = entitlement_coverage(consumer, ent, &active);
                if !coverage.covered {
                    status.add_reasons(coverage.reasons);
                }
            }

            if is_unmapped_guest(ent) {
                status.add_reasons([ComplianceReason::unmapped_guest(ent.id.as_ref())]);
            }

            for product_id in relevant {
                if partially_stacked {
                    status.add_partial_product(product_id, ent);
                    continue;
                }
                let coverage = entitlement_coverage(consumer, ent, &active);
                if !coverage.covered && !stacked {
                    debug!(product = %product_id, "partially compliant (non-stacked)");
                    status.add_partial_product(product_id, ent);
                    status.add_reasons(coverage.reasons);
                } else {
                    status.add_compliant_product(product_id, ent);
                }
            }
        }

        // A product fully covered elsewhere is not partial; its stack stays
        // listed so it can still be repaired.
        let compliant = &status.compliant_products;
        status
            .partially_compliant_products
            .retain(|product_id, _| !compliant.contains_key(product_id));

        for installed in &consumer.installed_products {
            let product_id = &installed.product_id;
            if !status.compliant_products.contains_key(product_id)
                && !status.partially_compliant_products.contains_key(product_id)
            {
                status.non_compliant_products.push(product_id.clone());
                status.add_reasons([ComplianceReason::not_covered(product_id)]);
            }
        }

        status.status = Some(status.label());
        status
    }
}

/// Installed products of the consumer that the entitlement provides.
fn relevant_products(ent: &Entitlement, consumer: &Consumer) -> Vec<ProductId> {
    consumer
        .installed_products
        .iter()
        .filter(|p| ent.pool.provides(p.product_id.as_str()))
        .map(|p| p.product_id.clone())
        .collect()
}
