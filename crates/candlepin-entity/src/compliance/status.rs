//! Per-consumer, per-date compliance snapshot.

use std::collections::BTreeMap;

use candlepin_core::types::{ProductId, StackId, SyspurposeAttribute};
use candlepin_core::util::equals_ignore_case;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date_range::DateRange;
use super::reason::ComplianceReason;
use crate::entitlement::Entitlement;
use crate::serde_util;

/// Overall status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    /// Everything installed is covered and nothing needs attention.
    Valid,
    /// Nothing is uncovered but something is partial or flagged.
    Partial,
    /// At least one installed product has no coverage.
    Invalid,
}

/// Compliance status of a consumer on a date.
///
/// Also accepted as input to auto-bind, where only the product and stack
/// maps are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStatus {
    /// The date the status was computed for.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub date: Option<DateTime<Utc>>,
    /// Stacks that do not fully cover the consumer.
    #[serde(default)]
    pub partial_stacks: BTreeMap<StackId, Vec<Entitlement>>,
    /// Products covered only by partial entitlements or stacks.
    #[serde(default)]
    pub partially_compliant_products: BTreeMap<ProductId, Vec<Entitlement>>,
    /// Fully covered products.
    #[serde(default)]
    pub compliant_products: BTreeMap<ProductId, Vec<Entitlement>>,
    /// Installed products without any coverage.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub non_compliant_products: Vec<ProductId>,
    /// Why the consumer is not fully valid.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub reasons: Vec<ComplianceReason>,
    /// First instant at which the consumer stops being compliant.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub compliant_until: Option<DateTime<Utc>>,
    /// Current coverage window of each non-red installed product.
    #[serde(default)]
    pub product_compliance_date_ranges: Option<BTreeMap<ProductId, DateRange>>,
    /// Overall label, filled in once the status is final.
    #[serde(default)]
    pub status: Option<StatusLabel>,
}

impl ComplianceStatus {
    /// An empty status for `date`.
    pub fn on(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn add_partial_stack(&mut self, stack_id: StackId, entitlement: &Entitlement) {
        self.partial_stacks
            .entry(stack_id)
            .or_default()
            .push(entitlement.clone());
    }

    pub fn add_partial_product(&mut self, product_id: ProductId, entitlement: &Entitlement) {
        self.partially_compliant_products
            .entry(product_id)
            .or_default()
            .push(entitlement.clone());
    }

    pub fn add_compliant_product(&mut self, product_id: ProductId, entitlement: &Entitlement) {
        self.compliant_products
            .entry(product_id)
            .or_default()
            .push(entitlement.clone());
    }

    pub fn add_reasons(&mut self, reasons: impl IntoIterator<Item = ComplianceReason>) {
        self.reasons.extend(reasons);
    }

    /// No red products and no partially covered products.
    pub fn is_compliant(&self) -> bool {
        self.non_compliant_products.is_empty() && self.partially_compliant_products.is_empty()
    }

    /// At least one product is fully or partially covered.
    pub fn is_partially_compliant(&self) -> bool {
        !self.compliant_products.is_empty() || !self.partially_compliant_products.is_empty()
    }

    pub fn is_product_compliant(&self, product_id: &str) -> bool {
        self.compliant_products.contains_key(product_id)
    }

    pub fn is_product_partial(&self, product_id: &str) -> bool {
        self.partially_compliant_products.contains_key(product_id)
    }

    pub fn is_product_non_compliant(&self, product_id: &str) -> bool {
        self.non_compliant_products.iter().any(|p| p == product_id)
    }

    /// Derive the overall status label.
    pub fn label(&self) -> StatusLabel {
        if !self.non_compliant_products.is_empty() {
            StatusLabel::Invalid
        } else if !self.partially_compliant_products.is_empty() || !self.reasons.is_empty() {
            StatusLabel::Partial
        } else {
            StatusLabel::Valid
        }
    }

    /// Every entitlement in the compliant, partial and partial-stack maps.
    pub fn entitlements(&self) -> impl Iterator<Item = &Entitlement> {
        self.compliant_products
            .values()
            .chain(self.partially_compliant_products.values())
            .chain(self.partial_stacks.values())
            .flatten()
    }

    /// Distinct values the consumer's current entitlements already offer
    /// for a system purpose dimension.
    ///
    /// For products this is the set of compliant product ids.
    pub fn satisfied_values(&self, attr: SyspurposeAttribute) -> Vec<String> {
        let Some(name) = attr.product_attribute() else {
            return self
                .compliant_products
                .keys()
                .map(|p| p.as_str().to_string())
                .collect();
        };

        let mut values: Vec<String> = Vec::new();
        for ent in self.entitlements() {
            if let Some(value) = ent.pool.product_attribute(name).filter(|v| !v.is_empty()) {
                if !values
                    .iter()
                    .any(|v| equals_ignore_case(Some(v), Some(value)))
                {
                    values.push(value.to_string());
                }
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;

    #[test]
    fn test_labels() {
        let mut status = ComplianceStatus::default();
        assert_eq!(status.label(), StatusLabel::Valid);

        status.add_reasons([ComplianceReason::unmapped_guest(None)]);
        assert_eq!(status.label(), StatusLabel::Partial);

        status.non_compliant_products.push(ProductId::from("p"));
        assert_eq!(status.label(), StatusLabel::Invalid);
    }

    #[test]
    fn test_satisfied_values_are_deduplicated_ignoring_case() {
        let mut status = ComplianceStatus::default();
        let a = Entitlement::new(
            "e1",
            Pool::new("p1", "x").with_product_attribute("support_level", "Premium"),
            1,
        );
        let b = Entitlement::new(
            "e2",
            Pool::new("p2", "y").with_product_attribute("support_level", "premium"),
            1,
        );
        status.add_compliant_product(ProductId::from("x"), &a);
        status.add_partial_product(ProductId::from("y"), &b);
        assert_eq!(
            status.satisfied_values(SyspurposeAttribute::SupportLevel),
            vec!["Premium"]
        );
        assert_eq!(
            status.satisfied_values(SyspurposeAttribute::Products),
            vec!["x"]
        );
    }
}
